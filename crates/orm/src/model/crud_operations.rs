//! CRUD Operations - static lookups and creation for models

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::database::Executor;
use crate::error::{ModelError, ModelResult};
use crate::model::attributes::AttributeMap;
use crate::model::core_trait::Model;
use crate::model::instance::{describe_key, ModelInstance};
use crate::model::query_methods::ModelQuery;
use crate::query::QueryBuilder;

/// Trait providing CRUD operations for models
#[allow(async_fn_in_trait)]
pub trait CrudOperations: Model {
    /// Start a typed query on this model's table
    fn query() -> ModelQuery<Self> {
        ModelQuery::new()
    }

    /// Find a model by its primary key
    async fn find<'e>(
        executor: impl Into<Executor<'e>>,
        id: impl Into<JsonValue>,
    ) -> ModelResult<Option<ModelInstance<Self>>> {
        Self::query()
            .where_eq(Self::primary_key_name(), id)
            .first(executor)
            .await
    }

    /// Find a model by its primary key or return an error if not found
    async fn find_or_fail<'e>(
        executor: impl Into<Executor<'e>>,
        id: impl Into<JsonValue>,
    ) -> ModelResult<ModelInstance<Self>> {
        let id = id.into();
        Self::find(executor, id.clone())
            .await?
            .ok_or_else(|| ModelError::NotFound(describe_key(&Self::table_name(), &id)))
    }

    async fn find_by<'e>(
        executor: impl Into<Executor<'e>>,
        column: &str,
        value: impl Into<JsonValue>,
    ) -> ModelResult<Option<ModelInstance<Self>>> {
        Self::query().where_eq(column, value).first(executor).await
    }

    async fn find_by_or_fail<'e>(
        executor: impl Into<Executor<'e>>,
        column: &str,
        value: impl Into<JsonValue>,
    ) -> ModelResult<ModelInstance<Self>> {
        let value = value.into();
        Self::find_by(executor, column, value.clone()).await?.ok_or_else(|| {
            ModelError::NotFound(format!("{} where {} = {}", Self::table_name(), column, value))
        })
    }

    /// First row ordered by primary key
    async fn first<'e>(executor: impl Into<Executor<'e>>) -> ModelResult<Option<ModelInstance<Self>>> {
        Self::query()
            .order_by(Self::primary_key_name())
            .first(executor)
            .await
    }

    async fn first_or_fail<'e>(executor: impl Into<Executor<'e>>) -> ModelResult<ModelInstance<Self>> {
        Self::first(executor)
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("{} is empty", Self::table_name())))
    }

    /// Every row, ordered by primary key
    async fn all<'e>(executor: impl Into<Executor<'e>>) -> ModelResult<Vec<ModelInstance<Self>>> {
        Self::query()
            .order_by(Self::primary_key_name())
            .fetch(executor)
            .await
    }

    async fn count<'e>(executor: impl Into<Executor<'e>>) -> ModelResult<i64> {
        Self::query().count(executor).await
    }

    /// Stage `attributes` on a new instance and insert it
    async fn create<'e>(
        executor: impl Into<Executor<'e>>,
        attributes: AttributeMap,
    ) -> ModelResult<ModelInstance<Self>> {
        let mut instance = ModelInstance::make(attributes)?;
        instance.save(executor).await?;
        Ok(instance)
    }

    /// Insert several rows one after another
    async fn create_many<'e>(
        executor: impl Into<Executor<'e>>,
        rows: Vec<AttributeMap>,
    ) -> ModelResult<Vec<ModelInstance<Self>>> {
        let mut exec = executor.into();
        let mut created = Vec::with_capacity(rows.len());
        for attributes in rows {
            created.push(Self::create(exec.reborrow(), attributes).await?);
        }
        Ok(created)
    }

    /// Remove every row of the table
    async fn truncate<'e>(executor: impl Into<Executor<'e>>) -> ModelResult<u64> {
        let mut exec = executor.into();
        debug!("Truncating {}", Self::table_name());
        exec.execute(&QueryBuilder::new().delete_from(&Self::table_name()))
            .await
    }
}

impl<M: Model> CrudOperations for M {}
