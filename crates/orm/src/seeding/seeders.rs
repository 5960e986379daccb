//! Ready-made seeders: closures and factory-backed bulk inserts

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::info;

use super::{Environment, Seeder};
use crate::database::Database;
use crate::error::ModelResult;
use crate::factory;
use crate::model::Model;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Seeder backed by an async closure
pub struct CustomSeeder {
    name: String,
    environments: Vec<Environment>,
    run_fn: Arc<dyn Fn(Database) -> BoxFuture<anyhow::Result<()>> + Send + Sync>,
}

impl CustomSeeder {
    pub fn new<F, Fut>(name: impl Into<String>, run_fn: F) -> Self
    where
        F: Fn(Database) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            environments: Vec::new(),
            run_fn: Arc::new(move |db: Database| -> BoxFuture<anyhow::Result<()>> { Box::pin(run_fn(db)) }),
        }
    }

    pub fn environments(mut self, environments: Vec<Environment>) -> Self {
        self.environments = environments;
        self
    }
}

#[async_trait]
impl Seeder for CustomSeeder {
    fn name(&self) -> &str {
        &self.name
    }

    fn environments(&self) -> Vec<Environment> {
        self.environments.clone()
    }

    async fn run(&self, db: &Database) -> ModelResult<()> {
        (self.run_fn)(db.clone()).await?;
        Ok(())
    }
}

/// Seeder that inserts `count` rows from a blueprint in the process-wide factory registry
pub struct FactorySeeder {
    name: String,
    count: usize,
    data: JsonValue,
    environments: Vec<Environment>,
    create: Arc<dyn Fn(Database, usize, JsonValue) -> BoxFuture<ModelResult<usize>> + Send + Sync>,
}

impl FactorySeeder {
    /// Rows created through `ModelFactory<M>`, so hooks and timestamps apply
    pub fn for_model<M: Model>(count: usize) -> Self {
        Self {
            name: M::model_name().to_string(),
            count,
            data: JsonValue::Null,
            environments: Vec::new(),
            create: Arc::new(|db: Database, count: usize, data: JsonValue| -> BoxFuture<ModelResult<usize>> {
                Box::pin(async move {
                    let mut factory = factory::model::<M>()?;
                    let created = factory.create_many(&db, count, data).await?;
                    Ok(created.len())
                })
            }),
        }
    }

    /// Rows inserted directly into the table named like the blueprint
    pub fn for_table(blueprint: &str, count: usize) -> Self {
        let blueprint = blueprint.to_string();
        Self {
            name: blueprint.clone(),
            count,
            data: JsonValue::Null,
            environments: Vec::new(),
            create: Arc::new(move |db: Database, count: usize, data: JsonValue| -> BoxFuture<ModelResult<usize>> {
                let blueprint = blueprint.clone();
                Box::pin(async move {
                    let mut factory = factory::table(&blueprint)?;
                    let created = factory.create_many(&db, count, data).await?;
                    Ok(created.len())
                })
            }),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override data handed to the blueprint for every row
    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }

    pub fn environments(mut self, environments: Vec<Environment>) -> Self {
        self.environments = environments;
        self
    }
}

#[async_trait]
impl Seeder for FactorySeeder {
    fn name(&self) -> &str {
        &self.name
    }

    fn environments(&self) -> Vec<Environment> {
        self.environments.clone()
    }

    async fn run(&self, db: &Database) -> ModelResult<()> {
        info!("Running seeder: {} (creating {} records)", self.name, self.count);
        let created = (self.create)(db.clone(), self.count, self.data.clone()).await?;
        info!("Seeder {} completed: created {} records", self.name, created);
        Ok(())
    }
}
