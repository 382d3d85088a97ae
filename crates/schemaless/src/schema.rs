//! Schema reflection: model field declarations → ordered column declarations.
//!
//! Every model type is reflected once. Models derived with `#[derive(Model)]` are
//! registered through `inventory` and reflected when the registry is first used;
//! hand-written [`Model`] impls are reflected on first lookup and added under the
//! write lock. Entries are never replaced once present.

use crate::error::{OrmError, OrmResult};
use crate::ident::Dialect;
use crate::model::{FieldDef, Model};
use indexmap::IndexMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// SQL type keywords an explicit column declaration must contain.
pub const TYPE_KEYWORDS: &[&str] = &[
    "int",
    "integer",
    "real",
    "text",
    "varchar",
    "char",
    "blob",
    "numeric",
    "decimal",
    "float",
    "double",
    "bool",
    "boolean",
    "date",
    "datetime",
    "timestamp",
    "time",
    "serial",
    "bigint",
    "smallint",
];

/// Whether a DDL fragment names a recognized SQL type.
pub fn has_type_keyword(ddl: &str) -> bool {
    ddl.split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|word| {
            let word = word.to_ascii_lowercase();
            TYPE_KEYWORDS.contains(&word.as_str())
        })
}

/// Column type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// An explicit declaration, used verbatim (`"int not null"`).
    Custom(&'static str),
    /// The store-assigned identifier.
    PrimaryKey,
}

impl ColumnType {
    /// The declaration as written into `CREATE TABLE` (SQLite flavour).
    pub const fn ddl(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Custom(ddl) => *ddl,
            Self::PrimaryKey => "integer PRIMARY KEY",
        }
    }
}

/// One reflected column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub column_type: ColumnType,
}

/// The reflected table layout of a model.
///
/// Columns keep declaration order, except the primary key which is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub model: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Column name → DDL in emission order.
    pub fn column_declarations(&self, dialect: Dialect) -> IndexMap<String, String> {
        self.columns
            .iter()
            .map(|c| {
                (
                    c.name.to_string(),
                    dialect.column_ddl(&c.column_type).into_owned(),
                )
            })
            .collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        let mut sql = String::from("CREATE TABLE IF NOT EXISTS ");
        dialect.write_ident(&mut sql, self.table);
        sql.push_str(" (");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            dialect.write_ident(&mut sql, column.name);
            sql.push(' ');
            sql.push_str(&dialect.column_ddl(&column.column_type));
        }
        sql.push(')');
        sql
    }

    /// Column names in emission order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

/// Reflect a model's declarations without touching the registry.
pub fn reflect<M: Model>() -> OrmResult<TableSchema> {
    reflect_parts(M::MODEL, M::TABLE, M::PRIMARY_KEY, M::fields())
}

fn reflect_parts(
    model: &'static str,
    table: &'static str,
    primary_key: &'static str,
    fields: &'static [FieldDef],
) -> OrmResult<TableSchema> {
    let invalid = |reason: String| OrmError::invalid_model(model, reason);

    if table.trim().is_empty() {
        return Err(invalid("table name is empty".to_string()));
    }
    if fields.is_empty() {
        return Err(invalid("model declares no fields".to_string()));
    }

    let pk_fields: Vec<&FieldDef> = fields.iter().filter(|f| f.primary_key).collect();
    let pk = match pk_fields.as_slice() {
        [pk] => *pk,
        other => {
            return Err(invalid(format!(
                "expected exactly one primary key field, found {}",
                other.len()
            )));
        }
    };
    if pk.column != primary_key {
        return Err(invalid(format!(
            "primary key field '{}' does not match declared primary key '{primary_key}'",
            pk.column
        )));
    }

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields.iter().filter(|f| !f.primary_key) {
        if field.column.is_empty() {
            return Err(invalid(format!("field '{}' has an empty column name", field.name)));
        }
        match field.column_type {
            ColumnType::PrimaryKey => {
                return Err(invalid(format!(
                    "field '{}' is typed as a primary key but is not the primary key",
                    field.name
                )));
            }
            ColumnType::Custom(ddl) if !has_type_keyword(ddl) => {
                return Err(invalid(format!(
                    "column '{}' declaration '{ddl}' has no recognized SQL type",
                    field.column
                )));
            }
            _ => {}
        }
        columns.push(ColumnSchema {
            name: field.column,
            column_type: field.column_type,
        });
    }
    columns.push(ColumnSchema {
        name: pk.column,
        column_type: ColumnType::PrimaryKey,
    });

    for (i, column) in columns.iter().enumerate() {
        if columns[..i].iter().any(|c| c.name == column.name) {
            return Err(invalid(format!("column '{}' is declared twice", column.name)));
        }
    }

    Ok(TableSchema {
        model,
        table,
        primary_key,
        columns,
    })
}

// ==================== Registry ====================

/// Registration entry for auto-registering models.
///
/// Submitted by `#[derive(Model)]`; collected when the registry is first used.
pub struct ModelRegistration {
    pub register_fn: fn(&mut SchemaRegistry),
}

inventory::collect!(ModelRegistration);

/// Reflected schemas keyed by model type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: HashMap<TypeId, Arc<TableSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reflect and register a model. Invalid models are skipped; they fail again
    /// with the reflection error on lookup.
    pub fn register<M: Model>(&mut self) {
        if let Ok(schema) = reflect::<M>() {
            self.tables
                .entry(TypeId::of::<M>())
                .or_insert_with(|| Arc::new(schema));
        }
    }

    pub fn get<M: Model>(&self) -> Option<Arc<TableSchema>> {
        self.tables.get(&TypeId::of::<M>()).cloned()
    }
}

fn registry() -> &'static RwLock<SchemaRegistry> {
    static REGISTRY: OnceLock<RwLock<SchemaRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = SchemaRegistry::new();
        for reg in inventory::iter::<ModelRegistration> {
            (reg.register_fn)(&mut registry);
        }
        RwLock::new(registry)
    })
}

/// The memoized schema of a model.
pub fn schema_of<M: Model>() -> OrmResult<Arc<TableSchema>> {
    let found = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get::<M>();
    if let Some(schema) = found {
        return Ok(schema);
    }

    let schema = Arc::new(reflect::<M>()?);
    let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
    Ok(registry
        .tables
        .entry(TypeId::of::<M>())
        .or_insert(schema)
        .clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn field(
        name: &'static str,
        column_type: ColumnType,
        primary_key: bool,
    ) -> FieldDef {
        FieldDef {
            name,
            column: name,
            column_type,
            required: false,
            primary_key,
        }
    }

    static TESTER: &[FieldDef] = &[
        field("id", ColumnType::PrimaryKey, true),
        field("userId", ColumnType::Custom("int not null"), false),
        field("name", ColumnType::Custom("text not null"), false),
    ];

    #[test]
    fn primary_key_moves_last() {
        let schema = reflect_parts("Tester", "MapperModelTester", "id", TESTER).unwrap();
        let names: Vec<_> = schema.column_names().collect();
        assert_eq!(names, ["userId", "name", "id"]);

        let decls = schema.column_declarations(Dialect::Sqlite);
        assert_eq!(decls["userId"], "int not null");
        assert_eq!(decls["id"], "integer PRIMARY KEY");
    }

    #[test]
    fn create_table_statement() {
        let schema = reflect_parts("Tester", "MapperModelTester", "id", TESTER).unwrap();
        assert_eq!(
            schema.create_table_sql(Dialect::Sqlite),
            "CREATE TABLE IF NOT EXISTS `MapperModelTester` (`userId` int not null, `name` text not null, `id` integer PRIMARY KEY)"
        );
        assert_eq!(
            schema.create_table_sql(Dialect::Postgres),
            r#"CREATE TABLE IF NOT EXISTS "MapperModelTester" ("userId" int not null, "name" text not null, "id" bigserial PRIMARY KEY)"#
        );
    }

    #[test]
    fn rejects_missing_or_extra_primary_keys() {
        static NO_PK: &[FieldDef] = &[field("name", ColumnType::Text, false)];
        let err = reflect_parts("NoPk", "NoPk", "id", NO_PK).unwrap_err();
        assert!(err.is_invalid_model());

        static TWO_PK: &[FieldDef] = &[
            field("id", ColumnType::PrimaryKey, true),
            field("other", ColumnType::PrimaryKey, true),
        ];
        assert!(reflect_parts("TwoPk", "TwoPk", "id", TWO_PK).is_err());

        static WRONG_PK: &[FieldDef] = &[field("key", ColumnType::PrimaryKey, true)];
        assert!(reflect_parts("WrongPk", "WrongPk", "id", WRONG_PK).is_err());
    }

    #[test]
    fn rejects_empty_tables_and_bad_declarations() {
        assert!(reflect_parts("Empty", "Empty", "id", &[]).is_err());
        assert!(reflect_parts("Blank", " ", "id", TESTER).is_err());

        static BAD_DDL: &[FieldDef] = &[
            field("id", ColumnType::PrimaryKey, true),
            field("name", ColumnType::Custom("not null"), false),
        ];
        let err = reflect_parts("Bad", "Bad", "id", BAD_DDL).unwrap_err();
        assert!(err.to_string().contains("no recognized SQL type"));

        static DUPLICATE: &[FieldDef] = &[
            field("id", ColumnType::PrimaryKey, true),
            field("name", ColumnType::Text, false),
            field("name", ColumnType::Text, false),
        ];
        assert!(reflect_parts("Dup", "Dup", "id", DUPLICATE).is_err());
    }

    macro_rules! hand_written_model {
        ($name:ident, $table:literal) => {
            #[derive(Default)]
            struct $name {
                id: i64,
            }

            impl Model for $name {
                const MODEL: &'static str = $table;
                const TABLE: &'static str = $table;
                const PRIMARY_KEY: &'static str = "id";

                fn fields() -> &'static [FieldDef] {
                    static FIELDS: &[FieldDef] = &[
                        field("reading", ColumnType::Real, false),
                        field("id", ColumnType::PrimaryKey, true),
                    ];
                    FIELDS
                }

                fn from_record(_record: crate::value::Record) -> OrmResult<Self> {
                    Ok(Self::default())
                }

                fn to_record(&self) -> crate::value::Record {
                    crate::value::Record::new()
                }

                fn get(&self, column: &str) -> OrmResult<crate::value::Value> {
                    Err(OrmError::unknown_property(Self::MODEL, column))
                }

                fn set(&mut self, column: &str, _value: crate::value::Value) -> OrmResult<()> {
                    Err(OrmError::unknown_property(Self::MODEL, column))
                }

                fn id(&self) -> Option<i64> {
                    crate::model::IdField::to_id(&self.id)
                }

                fn set_id(&mut self, id: i64) {
                    self.id = id;
                }
            }
        };
    }

    hand_written_model!(Gauge, "Gauge");
    hand_written_model!(Meter, "Meter");

    #[test]
    fn schema_of_returns_the_same_entry() {
        let first = schema_of::<Gauge>().unwrap();
        let second = schema_of::<Gauge>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.column_names().collect::<Vec<_>>(), ["reading", "id"]);

        let registered = registry()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get::<Gauge>()
            .unwrap();
        assert!(Arc::ptr_eq(&first, &registered));
    }

    #[test]
    fn concurrent_first_lookups_share_one_entry() {
        use std::sync::Barrier;

        const THREADS: usize = 8;
        let barrier = Barrier::new(THREADS);
        let schemas: Vec<Arc<TableSchema>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        schema_of::<Meter>().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for schema in &schemas {
            assert!(Arc::ptr_eq(schema, &schemas[0]));
        }
        assert!(Arc::ptr_eq(&schema_of::<Meter>().unwrap(), &schemas[0]));
    }

    #[test]
    fn type_keywords_match_whole_words() {
        assert!(has_type_keyword("int not null"));
        assert!(has_type_keyword("VARCHAR(255)"));
        assert!(has_type_keyword("timestamp default now()"));
        assert!(!has_type_keyword("not null"));
        assert!(!has_type_keyword("interval"));
    }
}
