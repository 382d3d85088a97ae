//! Data mapper: model-level CRUD over a [`Store`].
//!
//! Every operation resolves the model's schema first, so a malformed model fails
//! with [`OrmError::InvalidModel`] before the store is touched. Store errors are
//! returned unchanged.
//!
//! # Concurrency
//!
//! [`Mapper::persist`] decides between INSERT and UPDATE from the model's primary
//! key, then issues one statement. The decision is not atomic: two tasks
//! persisting the same unsaved model at once will both insert. Serialize such
//! writes, or give the table a unique column and handle the conflict.
//!
//! ```ignore
//! let mapper = Mapper::new(SqlStore::connect(&config)?);
//! mapper.create_table::<User>().await?;
//!
//! let mut user = User::from_record(record! { "groupId" => 5, "name" => "Abdul" })?;
//! mapper.persist(&mut user).await?;
//!
//! let found: Option<User> = mapper
//!     .get_single(&Criteria::new().eq(User::COL_NAME, "Abdul"), None)
//!     .await?;
//! ```

use crate::clause::{Criteria, OrderBy};
use crate::error::{OrmError, OrmResult};
use crate::model::{Model, foreign_key_for};
use crate::schema::{TableSchema, schema_of};
use crate::store::Store;
use crate::value::{Record, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// Maps models onto a store.
#[derive(Debug, Clone)]
pub struct Mapper<S> {
    store: S,
}

impl<S: Store> Mapper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Table a model is stored in.
    pub fn table_name<M: Model>(&self) -> OrmResult<&'static str> {
        Ok(schema_of::<M>()?.table)
    }

    /// Column → DDL declarations of a model, in `CREATE TABLE` order.
    pub fn columns_for<M: Model>(&self) -> OrmResult<IndexMap<String, String>> {
        Ok(schema_of::<M>()?.column_declarations(self.store.dialect()))
    }

    /// `CREATE TABLE IF NOT EXISTS` for a model.
    pub async fn create_table<M: Model>(&self) -> OrmResult<Vec<Record>> {
        let schema = schema_of::<M>()?;
        let sql = schema.create_table_sql(self.store.dialect());
        self.store.execute(&sql).await
    }

    /// Insert an unsaved model and assign its new id, or update a saved one.
    pub async fn persist<'m, M: Model>(&self, model: &'m mut M) -> OrmResult<&'m mut M> {
        let schema = schema_of::<M>()?;
        let mut values = model.to_record();

        match model.id() {
            Some(id) => {
                let criteria = Criteria::new().eq(schema.primary_key, id);
                self.store.update(schema.table, &values, &criteria).await?;
            }
            None => {
                values.shift_remove(schema.primary_key);
                let id = self
                    .store
                    .save(schema.table, schema.primary_key, &values)
                    .await?;
                model.set_id(id);
            }
        }
        Ok(model)
    }

    /// Models matching `criteria`; every row when it is empty.
    ///
    /// Without an explicit order, rows come back by ascending primary key.
    pub async fn get<M: Model>(
        &self,
        criteria: &Criteria,
        order: Option<&OrderBy>,
    ) -> OrmResult<Vec<M>> {
        self.fetch(criteria, order, None).await
    }

    /// Like [`Mapper::get`], returning at most `limit` models.
    pub async fn get_limited<M: Model>(
        &self,
        criteria: &Criteria,
        order: Option<&OrderBy>,
        limit: u64,
    ) -> OrmResult<Vec<M>> {
        self.fetch(criteria, order, Some(limit)).await
    }

    /// The first matching model, or `None`.
    pub async fn get_single<M: Model>(
        &self,
        criteria: &Criteria,
        order: Option<&OrderBy>,
    ) -> OrmResult<Option<M>> {
        let schema = schema_of::<M>()?;
        let order = resolve_order(&schema, order);
        let row = self
            .store
            .get_single(schema.table, criteria, Some(&order))
            .await?;
        row.map(M::from_record).transpose()
    }

    /// Number of models matching `criteria`.
    pub async fn get_count<M: Model>(&self, criteria: &Criteria) -> OrmResult<i64> {
        let schema = schema_of::<M>()?;
        self.store
            .get_count(schema.table, schema.primary_key, criteria)
            .await
    }

    /// The `A` that `from` points at through its `<aTable>Id` field.
    ///
    /// A null reference yields `None` without querying the store.
    pub async fn get_associated<A: Model, M: Model>(&self, from: &M) -> OrmResult<Option<A>> {
        let target = schema_of::<A>()?;
        schema_of::<M>()?;

        let field = foreign_key_for::<A>();
        let value = match from.get(&field) {
            Ok(value) => value,
            Err(OrmError::UnknownProperty { .. }) => {
                return Err(OrmError::MissingAssociation {
                    model: M::MODEL.to_string(),
                    field,
                });
            }
            Err(other) => return Err(other),
        };
        if value.is_null() {
            return Ok(None);
        }

        let criteria = Criteria::new().eq(target.primary_key, value);
        self.get_single::<A>(&criteria, None).await
    }

    /// Delete every `M` row matching `criteria`; empty criteria delete them all.
    pub async fn delete<M: Model>(&self, criteria: &Criteria) -> OrmResult<()> {
        let schema = schema_of::<M>()?;
        self.store.delete(schema.table, criteria).await
    }

    /// Delete the row backing a saved model.
    pub async fn delete_model<M: Model>(&self, model: &M) -> OrmResult<()> {
        let schema = schema_of::<M>()?;
        let id = model
            .id()
            .ok_or_else(|| OrmError::MissingIdentifier(M::MODEL.to_string()))?;
        let criteria = Criteria::new().eq(schema.primary_key, id);
        self.store.delete(schema.table, &criteria).await
    }

    pub async fn delete_by_id<M: Model>(&self, id: impl Into<Value>) -> OrmResult<()> {
        let schema = schema_of::<M>()?;
        let criteria = Criteria::new().eq(schema.primary_key, id);
        self.store.delete(schema.table, &criteria).await
    }

    /// Hydrate one model per row.
    pub fn bind_rows<M: Model>(&self, rows: Vec<Record>) -> OrmResult<Vec<M>> {
        schema_of::<M>()?;
        rows.into_iter().map(M::from_record).collect()
    }

    async fn fetch<M: Model>(
        &self,
        criteria: &Criteria,
        order: Option<&OrderBy>,
        limit: Option<u64>,
    ) -> OrmResult<Vec<M>> {
        let schema = schema_of::<M>()?;
        let order = resolve_order(&schema, order);
        let rows = if criteria.is_empty() {
            self.store.get_all(schema.table, Some(&order), limit).await?
        } else {
            self.store
                .get(schema.table, criteria, Some(&order), limit)
                .await?
        };
        self.bind_rows(rows)
    }
}

fn resolve_order(schema: &Arc<TableSchema>, order: Option<&OrderBy>) -> OrderBy {
    order
        .cloned()
        .unwrap_or_else(|| OrderBy::asc(schema.primary_key))
}
