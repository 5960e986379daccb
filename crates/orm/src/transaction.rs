//! Transaction Management
//!
//! An explicitly obtained transaction handle. Callers pass it into
//! persistence calls through `Executor` and finish it with `commit` or
//! `rollback`; a handle dropped while still open is rolled back.

use tracing::{debug, warn};

use crate::backends::{DatabaseRow, DatabaseTransaction};
use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;

/// Transaction isolation levels supported by PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    /// PostgreSQL default
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Convert to SQL string for SET TRANSACTION ISOLATION LEVEL command
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Transaction configuration options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionConfig {
    /// `None` keeps the server default
    pub isolation_level: Option<IsolationLevel>,
    pub read_only: bool,
}

impl TransactionConfig {
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    pub fn serializable() -> Self {
        Self {
            isolation_level: Some(IsolationLevel::Serializable),
            ..Default::default()
        }
    }
}

/// Open transaction handle
pub struct Transaction {
    inner: Option<Box<dyn DatabaseTransaction>>,
    config: TransactionConfig,
    committed: bool,
}

impl Transaction {
    pub(crate) fn new(inner: Box<dyn DatabaseTransaction>, config: TransactionConfig) -> Self {
        Self {
            inner: Some(inner),
            config,
            committed: false,
        }
    }

    fn active(&mut self) -> ModelResult<&mut Box<dyn DatabaseTransaction>> {
        self.inner
            .as_mut()
            .ok_or_else(|| ModelError::Transaction("Transaction has already been consumed".to_string()))
    }

    /// Execute a statement inside the transaction
    pub async fn execute(&mut self, query: &QueryBuilder) -> ModelResult<u64> {
        self.active()?.execute(query).await
    }

    pub async fn fetch_all(&mut self, query: &QueryBuilder) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        self.active()?.fetch_all(query).await
    }

    pub async fn fetch_optional(&mut self, query: &QueryBuilder) -> ModelResult<Option<Box<dyn DatabaseRow>>> {
        self.active()?.fetch_optional(query).await
    }

    /// Commit the transaction
    pub async fn commit(mut self) -> ModelResult<()> {
        let tx = self
            .inner
            .take()
            .ok_or_else(|| ModelError::Transaction("Transaction has already been consumed".to_string()))?;
        debug!("Committing transaction");
        tx.commit().await?;
        self.committed = true;
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(mut self) -> ModelResult<()> {
        let tx = self
            .inner
            .take()
            .ok_or_else(|| ModelError::Transaction("Transaction has already been consumed".to_string()))?;
        debug!("Rolling back transaction");
        tx.rollback().await
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Whether the transaction is still open
    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .field("committed", &self.committed)
            .finish()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(tx) = self.inner.take() {
            // Backends roll back when their handle is dropped
            warn!("Transaction dropped without explicit commit or rollback, rolling back");
            drop(tx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::backends::MemoryPool;

    #[test]
    fn test_isolation_level_sql() {
        assert_eq!(IsolationLevel::ReadUncommitted.as_sql(), "READ UNCOMMITTED");
        assert_eq!(IsolationLevel::ReadCommitted.as_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::RepeatableRead.as_sql(), "REPEATABLE READ");
        assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_transaction_config_presets() {
        let config = TransactionConfig::default();
        assert!(config.isolation_level.is_none());
        assert!(!config.read_only);
        assert!(TransactionConfig::read_only().read_only);
        assert_eq!(
            TransactionConfig::serializable().isolation_level,
            Some(IsolationLevel::Serializable)
        );
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let pool = MemoryPool::new();
        let db = Database::from_memory(pool.clone());

        {
            let mut tx = db.transaction().await.unwrap();
            let insert = QueryBuilder::new().insert_into("notes").set("body", "draft");
            tx.execute(&insert).await.unwrap();
            assert!(tx.is_active());
        }

        assert!(pool.rows("notes").is_empty());
    }

    #[tokio::test]
    async fn test_commit_marks_transaction_committed() {
        let pool = MemoryPool::new();
        let db = Database::from_memory(pool.clone());

        let mut tx = db.transaction().await.unwrap();
        tx.execute(&QueryBuilder::new().insert_into("notes").set("body", "kept"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(pool.rows("notes").len(), 1);
    }
}
