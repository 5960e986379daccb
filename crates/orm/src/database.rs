//! Database handle and executors
//!
//! `Database` is a cheap-to-clone handle over a backend pool. `Executor`
//! names where a persistence call runs: the pool itself or an open
//! transaction passed in explicitly by the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::backends::{
    DatabaseBackendType, DatabasePool, DatabaseRow, MemoryPool, PostgresPool, SqlDialect,
};
use crate::config::DatabaseConfig;
use crate::error::ModelResult;
use crate::query::QueryBuilder;
use crate::transaction::{Transaction, TransactionConfig};

/// Shared database handle
#[derive(Clone)]
pub struct Database {
    pool: Arc<dyn DatabasePool>,
    backend: DatabaseBackendType,
}

impl Database {
    /// Connect using the backend selected by the configured URL
    pub async fn connect(config: &DatabaseConfig) -> ModelResult<Self> {
        config.validate()?;
        let backend = config.backend()?;
        info!("Connecting to {} database", backend);

        let pool: Arc<dyn DatabasePool> = match backend {
            DatabaseBackendType::PostgreSQL => Arc::new(PostgresPool::connect(config).await?),
            DatabaseBackendType::Memory => Arc::new(MemoryPool::new()),
        };

        Ok(Self { pool, backend })
    }

    /// Connect using `DATABASE_URL` and friends
    pub async fn from_env() -> ModelResult<Self> {
        Self::connect(&DatabaseConfig::from_env()?).await
    }

    /// Fresh, empty in-memory database
    pub fn memory() -> Self {
        Self::from_memory(MemoryPool::new())
    }

    /// Wrap an existing in-memory pool, keeping access to its statement log
    pub fn from_memory(pool: MemoryPool) -> Self {
        Self::from_pool(Arc::new(pool), DatabaseBackendType::Memory)
    }

    pub fn from_pool(pool: Arc<dyn DatabasePool>, backend: DatabaseBackendType) -> Self {
        Self { pool, backend }
    }

    pub fn backend_type(&self) -> &DatabaseBackendType {
        &self.backend
    }

    pub fn dialect(&self) -> SqlDialect {
        self.pool.dialect()
    }

    /// Begin a transaction with the default configuration
    pub async fn transaction(&self) -> ModelResult<Transaction> {
        self.transaction_with(TransactionConfig::default()).await
    }

    pub async fn transaction_with(&self, config: TransactionConfig) -> ModelResult<Transaction> {
        debug!("Beginning transaction with config: {:?}", config);
        let inner = self.pool.begin_transaction(&config).await?;
        Ok(Transaction::new(inner, config))
    }

    pub async fn execute(&self, query: &QueryBuilder) -> ModelResult<u64> {
        self.pool.execute(query).await
    }

    pub async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        self.pool.fetch_all(query).await
    }

    pub async fn fetch_optional(&self, query: &QueryBuilder) -> ModelResult<Option<Box<dyn DatabaseRow>>> {
        self.pool.fetch_optional(query).await
    }

    pub async fn health_check(&self) -> ModelResult<Duration> {
        self.pool.health_check().await
    }

    pub async fn close(&self) -> ModelResult<()> {
        self.pool.close().await
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("backend", &self.backend).finish()
    }
}

/// Where a persistence call runs
pub enum Executor<'e> {
    Pool(&'e Database),
    Transaction(&'e mut Transaction),
}

impl<'e> From<&'e Database> for Executor<'e> {
    fn from(db: &'e Database) -> Self {
        Executor::Pool(db)
    }
}

impl<'e> From<&'e mut Transaction> for Executor<'e> {
    fn from(tx: &'e mut Transaction) -> Self {
        Executor::Transaction(tx)
    }
}

impl<'e> Executor<'e> {
    /// Borrow this executor again for a nested call
    pub fn reborrow(&mut self) -> Executor<'_> {
        match self {
            Executor::Pool(db) => Executor::Pool(*db),
            Executor::Transaction(tx) => Executor::Transaction(&mut **tx),
        }
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, Executor::Transaction(_))
    }

    pub async fn execute(&mut self, query: &QueryBuilder) -> ModelResult<u64> {
        match self {
            Executor::Pool(db) => db.execute(query).await,
            Executor::Transaction(tx) => tx.execute(query).await,
        }
    }

    pub async fn fetch_all(&mut self, query: &QueryBuilder) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        match self {
            Executor::Pool(db) => db.fetch_all(query).await,
            Executor::Transaction(tx) => tx.fetch_all(query).await,
        }
    }

    pub async fn fetch_optional(&mut self, query: &QueryBuilder) -> ModelResult<Option<Box<dyn DatabaseRow>>> {
        match self {
            Executor::Pool(db) => db.fetch_optional(query).await,
            Executor::Transaction(tx) => tx.fetch_optional(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::DatabaseRowExt;

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let db = Database::connect(&DatabaseConfig::memory()).await.unwrap();
        assert_eq!(db.backend_type(), &DatabaseBackendType::Memory);
        assert_eq!(db.dialect(), SqlDialect::PostgreSQL);
        assert!(db.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_executor_routes_to_transaction() {
        let pool = MemoryPool::new();
        let db = Database::from_memory(pool.clone());
        let mut tx = db.transaction().await.unwrap();

        {
            let mut exec = Executor::from(&mut tx);
            assert!(exec.is_transaction());
            let insert = QueryBuilder::new().insert_into("tags").set("name", "rust");
            exec.reborrow().execute(&insert).await.unwrap();

            let count = exec
                .fetch_optional(&QueryBuilder::table("tags").count())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(count.get::<i64>("count").unwrap(), 1);
        }

        let mut exec = Executor::from(&db);
        let rows = exec.fetch_all(&QueryBuilder::table("tags")).await.unwrap();
        assert!(rows.is_empty());

        tx.rollback().await.unwrap();
    }
}
