//! Store configuration.
//!
//! A flat set of connection keys, built from key/value pairs or loaded from a
//! TOML file:
//!
//! ```toml
//! dbengine = "pgsql"
//! host = "localhost"
//! dbname = "app"
//! username = "app"
//! password = "${APP_DB_PASSWORD}"
//! ```
//!
//! `${VAR}` references in string values are replaced from the environment when
//! loading from TOML.

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default PostgreSQL port.
pub const DEFAULT_PG_PORT: u16 = 5432;

/// Default maximum pool size for PostgreSQL stores.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Database engines a store can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Sqlite,
    Postgres,
}

impl Engine {
    /// Parse an engine name (`sqlite`, `pgsql`, `postgres`, `postgresql`).
    pub fn parse(name: &str) -> OrmResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(OrmError::UnsupportedEngine(name.to_string())),
        }
    }
}

/// Connection settings for a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub dbengine: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// SQLite database file; in-memory when unset.
    pub path: Option<String>,
    /// `disable`, `prefer` or `require`. Pools built from this config connect
    /// without TLS and reject `require`.
    pub sslmode: Option<String>,
    pub pool_size: Option<usize>,
    /// Per-statement timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl StoreConfig {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            dbengine: Some("sqlite".to_string()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn sqlite_in_memory() -> Self {
        Self {
            dbengine: Some("sqlite".to_string()),
            ..Self::default()
        }
    }

    /// Build from key/value pairs. Empty values count as unset.
    ///
    /// ```ignore
    /// let config = StoreConfig::from_pairs([("dbengine", "sqlite"), ("path", "app.db")])?;
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> OrmResult<Self>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value: String = value.into();
            if value.trim().is_empty() {
                continue;
            }
            match key {
                "dbengine" => config.dbengine = Some(value),
                "host" => config.host = Some(value),
                "port" => config.port = Some(parse_number(key, &value)?),
                "dbname" => config.dbname = Some(value),
                "username" => config.username = Some(value),
                "password" => config.password = Some(value),
                "path" => config.path = Some(value),
                "sslmode" => config.sslmode = Some(value),
                "pool_size" => config.pool_size = Some(parse_number(key, &value)?),
                "timeout_ms" => config.timeout_ms = Some(parse_number(key, &value)?),
                other => return Err(OrmError::config(format!("unknown store setting: {other}"))),
            }
        }
        Ok(config)
    }

    /// Parse TOML, expand `${VAR}` references and validate.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        let mut config: Self = toml::from_str(raw)
            .map_err(|e| OrmError::config(format!("failed to parse store config: {e}")))?;
        config.expand_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// The configured engine.
    pub fn engine(&self) -> OrmResult<Engine> {
        match self.dbengine.as_deref() {
            Some(name) if !name.trim().is_empty() => Engine::parse(name),
            _ => Err(OrmError::config("dbengine must be set")),
        }
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PG_PORT)
    }

    pub fn pool_size_or_default(&self) -> usize {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> OrmResult<()> {
        self.engine()?;
        if self.pool_size == Some(0) {
            return Err(OrmError::config("pool_size must be greater than zero"));
        }
        if self.timeout_ms == Some(0) {
            return Err(OrmError::config("timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Connection settings for tokio-postgres.
    #[cfg(feature = "postgres")]
    pub fn pg_config(&self) -> OrmResult<tokio_postgres::Config> {
        use tokio_postgres::config::SslMode;

        let mut pg = tokio_postgres::Config::new();
        pg.host(self.host.as_deref().unwrap_or("localhost"));
        pg.port(self.port_or_default());
        if let Some(dbname) = &self.dbname {
            pg.dbname(dbname);
        }
        if let Some(user) = &self.username {
            pg.user(user);
        }
        if let Some(password) = &self.password {
            pg.password(password);
        }
        if let Some(mode) = &self.sslmode {
            pg.ssl_mode(match mode.as_str() {
                "disable" => SslMode::Disable,
                "prefer" => SslMode::Prefer,
                "require" => SslMode::Require,
                other => return Err(OrmError::config(format!("unsupported sslmode: {other}"))),
            });
        }
        Ok(pg)
    }

    fn expand_env(&mut self) -> OrmResult<()> {
        for field in [
            &mut self.dbengine,
            &mut self.host,
            &mut self.dbname,
            &mut self.username,
            &mut self.password,
            &mut self.path,
            &mut self.sslmode,
        ] {
            if let Some(value) = field.as_mut() {
                *value = expand_env_vars(value)?;
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> OrmResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| OrmError::config(format!("invalid {key} '{value}': {e}")))
}

fn expand_env_vars(input: &str) -> OrmResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(OrmError::config(format!(
                    "unterminated env var reference: ${{{key}}}"
                )));
            }
            if key.is_empty() {
                return Err(OrmError::config("invalid env var reference: ${}"));
            }

            let v = std::env::var(&key).map_err(|_| {
                OrmError::config(format!("missing env var for config expansion: {key}"))
            })?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
