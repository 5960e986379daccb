//! PostgreSQL Backend Implementation
//!
//! Renders `QueryBuilder` statements to PostgreSQL and runs them through sqlx.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Pool, Postgres, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::core::*;
use crate::config::DatabaseConfig;
use crate::error::{OrmError, OrmResult};
use crate::query::QueryBuilder;
use crate::transaction::TransactionConfig;

/// PostgreSQL connection pool implementation
#[derive(Debug, Clone)]
pub struct PostgresPool {
    pool: Arc<Pool<Postgres>>,
}

impl PostgresPool {
    pub fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }

    /// Open a sqlx pool using the given configuration
    pub async fn connect(config: &DatabaseConfig) -> OrmResult<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(config.pool.max_connections)
            .min_connections(config.pool.min_connections)
            .acquire_timeout(Duration::from_secs(config.pool.acquire_timeout))
            .test_before_acquire(config.pool.test_before_acquire);

        if let Some(idle_timeout) = config.pool.idle_timeout {
            options = options.idle_timeout(Duration::from_secs(idle_timeout));
        }

        if let Some(max_lifetime) = config.pool.max_lifetime {
            options = options.max_lifetime(Duration::from_secs(max_lifetime));
        }

        let pool = options
            .connect(&config.url)
            .await
            .map_err(|e| OrmError::Connection(format!("Failed to create PostgreSQL pool: {}", e)))?;

        Ok(Self::new(Arc::new(pool)))
    }

    /// Access the underlying sqlx pool
    pub fn inner(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

fn render(query: &QueryBuilder) -> OrmResult<(String, Vec<DatabaseValue>)> {
    let (sql, params) = query.to_sql_with_params(&SqlDialect::PostgreSQL)?;
    debug!("postgres: {}", sql);
    Ok((sql, params.into_iter().map(DatabaseValue::from_json).collect()))
}

fn bind_all<'q>(sql: &'q str, params: &[DatabaseValue]) -> Query<'q, Postgres, PgArguments> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, param| bind_database_value(query, param))
}

fn boxed(rows: Vec<PgRow>) -> Vec<Box<dyn DatabaseRow>> {
    rows.into_iter()
        .map(|row| Box::new(PostgresRow::new(row)) as Box<dyn DatabaseRow>)
        .collect()
}

#[async_trait]
impl DatabasePool for PostgresPool {
    async fn execute(&self, query: &QueryBuilder) -> OrmResult<u64> {
        let (sql, params) = render(query)?;
        let result = bind_all(&sql, &params)
            .execute(&*self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query execution failed: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, query: &QueryBuilder) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let (sql, params) = render(query)?;
        let rows = bind_all(&sql, &params)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;
        Ok(boxed(rows))
    }

    async fn fetch_optional(&self, query: &QueryBuilder) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let (sql, params) = render(query)?;
        let row = bind_all(&sql, &params)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;
        Ok(row.map(|r| Box::new(PostgresRow::new(r)) as Box<dyn DatabaseRow>))
    }

    async fn begin_transaction(&self, config: &TransactionConfig) -> OrmResult<Box<dyn DatabaseTransaction>> {
        debug!("Beginning transaction with config: {:?}", config);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrmError::Transaction(format!("Failed to begin transaction: {}", e)))?;

        if let Some(isolation_level) = config.isolation_level {
            let sql = format!("SET TRANSACTION ISOLATION LEVEL {}", isolation_level.as_sql());
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| OrmError::Transaction(format!("Failed to set isolation level: {}", e)))?;
        }

        if config.read_only {
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *tx)
                .await
                .map_err(|e| OrmError::Transaction(format!("Failed to set read-only mode: {}", e)))?;
        }

        Ok(Box::new(PostgresTransaction { tx: Some(tx) }))
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    async fn close(&self) -> OrmResult<()> {
        self.pool.close().await;
        Ok(())
    }

    async fn health_check(&self) -> OrmResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| OrmError::Connection(format!("Health check failed: {}", e)))?;
        Ok(start.elapsed())
    }
}

/// PostgreSQL transaction implementation
pub struct PostgresTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    fn active(&mut self) -> OrmResult<&mut sqlx::Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))
    }
}

#[async_trait]
impl DatabaseTransaction for PostgresTransaction {
    async fn execute(&mut self, query: &QueryBuilder) -> OrmResult<u64> {
        let (sql, params) = render(query)?;
        let tx = self.active()?;
        let result = bind_all(&sql, &params)
            .execute(&mut **tx)
            .await
            .map_err(|e| OrmError::Query(format!("Query execution failed: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&mut self, query: &QueryBuilder) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let (sql, params) = render(query)?;
        let tx = self.active()?;
        let rows = bind_all(&sql, &params)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;
        Ok(boxed(rows))
    }

    async fn fetch_optional(&mut self, query: &QueryBuilder) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let (sql, params) = render(query)?;
        let tx = self.active()?;
        let row = bind_all(&sql, &params)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))?;
        Ok(row.map(|r| Box::new(PostgresRow::new(r)) as Box<dyn DatabaseRow>))
    }

    async fn commit(mut self: Box<Self>) -> OrmResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))?;
        tx.commit()
            .await
            .map_err(|e| OrmError::Transaction(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(mut self: Box<Self>) -> OrmResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))?;
        tx.rollback()
            .await
            .map_err(|e| OrmError::Transaction(format!("Failed to rollback transaction: {}", e)))
    }
}

/// PostgreSQL row implementation
pub struct PostgresRow {
    row: PgRow,
}

impl PostgresRow {
    pub fn new(row: PgRow) -> Self {
        Self { row }
    }
}

impl DatabaseRow for PostgresRow {
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        let index = self
            .row
            .columns()
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| OrmError::Query(format!("Column '{}' not found", name)))?;
        postgres_value_to_database_value(&self.row, index)
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }

    fn to_json(&self) -> OrmResult<JsonValue> {
        let mut map = serde_json::Map::new();
        for (index, column) in self.row.columns().iter().enumerate() {
            let value = postgres_value_to_database_value(&self.row, index)?;
            map.insert(column.name().to_string(), value.to_json());
        }
        Ok(JsonValue::Object(map))
    }
}

/// Bind a DatabaseValue to a sqlx query
fn bind_database_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &DatabaseValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Uuid(u) => query.bind(*u),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::NaiveDateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Time(t) => query.bind(*t),
        DatabaseValue::Json(j) => query.bind(j.clone()),
    }
}

fn fetch<'r, T>(row: &'r PgRow, index: usize, kind: &str) -> OrmResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(index)
        .map_err(|e| OrmError::Query(format!("Failed to get {} value: {}", kind, e)))
}

/// Convert a PostgreSQL column value to DatabaseValue
fn postgres_value_to_database_value(row: &PgRow, index: usize) -> OrmResult<DatabaseValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| OrmError::Query(format!("Failed to read column {}: {}", index, e)))?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let type_name = row.columns()[index].type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOL" => DatabaseValue::Bool(fetch(row, index, "bool")?),
        "INT2" => DatabaseValue::Int32(fetch::<i16>(row, index, "int16")? as i32),
        "INT4" => DatabaseValue::Int32(fetch(row, index, "int32")?),
        "INT8" => DatabaseValue::Int64(fetch(row, index, "int64")?),
        "FLOAT4" => DatabaseValue::Float64(fetch::<f32>(row, index, "float32")? as f64),
        "FLOAT8" => DatabaseValue::Float64(fetch(row, index, "float64")?),
        "UUID" => DatabaseValue::Uuid(fetch(row, index, "uuid")?),
        "TIMESTAMPTZ" => DatabaseValue::DateTime(fetch(row, index, "timestamptz")?),
        "TIMESTAMP" => DatabaseValue::NaiveDateTime(fetch(row, index, "timestamp")?),
        "DATE" => DatabaseValue::Date(fetch(row, index, "date")?),
        "TIME" => DatabaseValue::Time(fetch(row, index, "time")?),
        "JSON" | "JSONB" => DatabaseValue::Json(fetch(row, index, "json")?),
        _ => DatabaseValue::String(fetch(row, index, &type_name)?),
    };
    Ok(value)
}
