//! Factories that insert blueprint output directly into a table

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{Blueprint, FactoryConfig, Faker};
use crate::database::Executor;
use crate::error::ModelResult;
use crate::model::AttributeMap;
use crate::query::QueryBuilder;

/// Inserts generated rows without going through a model
pub struct TableFactory {
    blueprint: Blueprint,
    faker: Faker,
    table: String,
    returning: String,
}

impl TableFactory {
    /// The target table defaults to the blueprint name
    pub fn new(blueprint: Blueprint, config: FactoryConfig) -> Self {
        Self {
            table: blueprint.name().to_string(),
            blueprint,
            faker: Faker::from_seed(config.seed),
            returning: "id".to_string(),
        }
    }

    /// Insert into `table` instead of the blueprint's name
    pub fn table(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Column handed back by `create`
    pub fn returning(mut self, column: &str) -> Self {
        self.returning = column.to_string();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.faker = Faker::seeded(seed);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn make(&mut self, data: JsonValue) -> AttributeMap {
        self.blueprint.generate(&mut self.faker, 0, &data)
    }

    pub fn make_many(&mut self, count: usize, data: JsonValue) -> Vec<AttributeMap> {
        (0..count)
            .map(|index| self.blueprint.generate(&mut self.faker, index, &data))
            .collect()
    }

    async fn insert(&self, exec: &mut Executor<'_>, row: AttributeMap) -> ModelResult<JsonValue> {
        let query = QueryBuilder::new()
            .insert_into(&self.table)
            .set_values(row)
            .returning(&self.returning);

        match exec.fetch_optional(&query).await? {
            Some(row) => Ok(row.get_by_name(&self.returning)?.to_json()),
            None => Ok(JsonValue::Null),
        }
    }

    /// Insert one row; returns the `returning` column
    pub async fn create<'e>(&mut self, executor: impl Into<Executor<'e>>, data: JsonValue) -> ModelResult<JsonValue> {
        let mut exec = executor.into();
        let row = self.make(data);
        self.insert(&mut exec, row).await
    }

    pub async fn create_many<'e>(
        &mut self,
        executor: impl Into<Executor<'e>>,
        count: usize,
        data: JsonValue,
    ) -> ModelResult<Vec<JsonValue>> {
        let mut exec = executor.into();
        let mut keys = Vec::with_capacity(count);
        for row in self.make_many(count, data) {
            keys.push(self.insert(&mut exec, row).await?);
        }
        debug!("Table factory inserted {} rows into {}", keys.len(), self.table);
        Ok(keys)
    }

    /// Delete every row of the target table
    pub async fn reset<'e>(&self, executor: impl Into<Executor<'e>>) -> ModelResult<u64> {
        let mut exec = executor.into();
        exec.execute(&QueryBuilder::new().delete_from(&self.table)).await
    }
}
