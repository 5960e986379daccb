//! Query Methods - typed queries over a model's table

use std::marker::PhantomData;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::backends::DatabaseRowExt;
use crate::database::Executor;
use crate::error::{ModelError, ModelResult};
use crate::model::attributes::AttributeMap;
use crate::model::core_trait::Model;
use crate::model::dates::{now_for_storage, DateCaster};
use crate::model::instance::ModelInstance;
use crate::query::QueryBuilder;

/// Query against `M`'s table that hydrates `ModelInstance<M>` results
pub struct ModelQuery<M: Model> {
    builder: QueryBuilder,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for ModelQuery<M> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> std::fmt::Debug for ModelQuery<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelQuery")
            .field("model", &M::model_name())
            .field("builder", &self.builder)
            .finish()
    }
}

impl<M: Model> Default for ModelQuery<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> ModelQuery<M> {
    pub fn new() -> Self {
        Self {
            builder: QueryBuilder::table(&M::table_name()),
            _model: PhantomData,
        }
    }

    /// The underlying statement
    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Apply arbitrary builder calls
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.builder = f(self.builder);
        self
    }

    pub fn where_eq<T: Into<JsonValue>>(self, column: &str, value: T) -> Self {
        self.map(|b| b.where_eq(column, value))
    }

    pub fn where_ne<T: Into<JsonValue>>(self, column: &str, value: T) -> Self {
        self.map(|b| b.where_ne(column, value))
    }

    pub fn where_gt<T: Into<JsonValue>>(self, column: &str, value: T) -> Self {
        self.map(|b| b.where_gt(column, value))
    }

    pub fn where_gte<T: Into<JsonValue>>(self, column: &str, value: T) -> Self {
        self.map(|b| b.where_gte(column, value))
    }

    pub fn where_lt<T: Into<JsonValue>>(self, column: &str, value: T) -> Self {
        self.map(|b| b.where_lt(column, value))
    }

    pub fn where_lte<T: Into<JsonValue>>(self, column: &str, value: T) -> Self {
        self.map(|b| b.where_lte(column, value))
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.map(|b| b.where_like(column, pattern))
    }

    pub fn where_in<T: Into<JsonValue>>(self, column: &str, values: Vec<T>) -> Self {
        self.map(|b| b.where_in(column, values))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.map(|b| b.where_null(column))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.map(|b| b.where_not_null(column))
    }

    pub fn where_between<T: Into<JsonValue>>(self, column: &str, start: T, end: T) -> Self {
        self.map(|b| b.where_between(column, start, end))
    }

    pub fn order_by(self, column: &str) -> Self {
        self.map(|b| b.order_by(column))
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.map(|b| b.order_by_desc(column))
    }

    pub fn limit(self, count: i64) -> Self {
        self.map(|b| b.limit(count))
    }

    pub fn offset(self, count: i64) -> Self {
        self.map(|b| b.offset(count))
    }

    pub fn paginate(self, per_page: i64, page: i64) -> Self {
        self.map(|b| b.paginate(per_page, page))
    }

    /// Fetch every matching row
    pub async fn fetch<'e>(&self, executor: impl Into<Executor<'e>>) -> ModelResult<Vec<ModelInstance<M>>> {
        let mut exec = executor.into();
        let rows = exec.fetch_all(&self.builder).await?;
        rows.iter()
            .map(|row| ModelInstance::from_row(row.as_ref()))
            .collect()
    }

    /// Fetch the first matching row
    pub async fn first<'e>(&self, executor: impl Into<Executor<'e>>) -> ModelResult<Option<ModelInstance<M>>> {
        let mut exec = executor.into();
        let query = self.builder.clone().limit(1);
        match exec.fetch_optional(&query).await? {
            Some(row) => Ok(Some(ModelInstance::from_row(row.as_ref())?)),
            None => Ok(None),
        }
    }

    pub async fn first_or_fail<'e>(&self, executor: impl Into<Executor<'e>>) -> ModelResult<ModelInstance<M>> {
        self.first(executor)
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("{} matching query", M::table_name())))
    }

    /// Count matching rows
    pub async fn count<'e>(&self, executor: impl Into<Executor<'e>>) -> ModelResult<i64> {
        let mut exec = executor.into();
        let query = self.builder.clone().count();
        let row = exec
            .fetch_optional(&query)
            .await?
            .ok_or_else(|| ModelError::Query("COUNT returned no rows".to_string()))?;
        row.get::<i64>("count")
    }

    /// Update every matching row without loading it. No hooks run.
    pub async fn update<'e>(&self, executor: impl Into<Executor<'e>>, values: AttributeMap) -> ModelResult<u64> {
        let mut exec = executor.into();
        let mut query = QueryBuilder::new().update(&M::table_name());
        for (column, value) in values {
            let value = DateCaster::format_for_storage::<M>(&column, value)?;
            query = query.set(&column, value);
        }
        if M::uses_timestamps() {
            query = query.set(M::updated_at_column(), now_for_storage());
        }
        query.where_conditions = self.builder.where_conditions.clone();

        debug!("Bulk update on {}", M::table_name());
        exec.execute(&query).await
    }

    /// Delete every matching row without loading it. No hooks run.
    pub async fn delete<'e>(&self, executor: impl Into<Executor<'e>>) -> ModelResult<u64> {
        let mut exec = executor.into();
        let mut query = QueryBuilder::new().delete_from(&M::table_name());
        query.where_conditions = self.builder.where_conditions.clone();

        debug!("Bulk delete on {}", M::table_name());
        exec.execute(&query).await
    }
}
