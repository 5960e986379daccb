//! Core Database Backend Traits
//!
//! The persistence seam of the ORM. Backends receive structured
//! `QueryBuilder` statements and return rows as JSON-like column maps.

use std::collections::HashMap;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, OrmResult};
use crate::model::dates::STORAGE_FORMAT;
use crate::query::QueryBuilder;
use crate::transaction::TransactionConfig;

/// Abstract database connection pool trait
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a statement and return the affected row count
    async fn execute(&self, query: &QueryBuilder) -> OrmResult<u64>;

    /// Execute a statement and return the result rows
    async fn fetch_all(&self, query: &QueryBuilder) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a statement and return the first result row
    async fn fetch_optional(&self, query: &QueryBuilder) -> OrmResult<Option<Box<dyn DatabaseRow>>>;

    /// Begin a transaction
    async fn begin_transaction(&self, config: &TransactionConfig) -> OrmResult<Box<dyn DatabaseTransaction>>;

    /// SQL dialect spoken by this backend
    fn dialect(&self) -> SqlDialect;

    /// Close the pool
    async fn close(&self) -> OrmResult<()>;

    /// Perform a health check on the pool
    async fn health_check(&self) -> OrmResult<std::time::Duration>;
}

/// Abstract database transaction trait
#[async_trait]
pub trait DatabaseTransaction: Send + Sync {
    /// Execute a statement within the transaction
    async fn execute(&mut self, query: &QueryBuilder) -> OrmResult<u64>;

    /// Execute a statement and return result rows within the transaction
    async fn fetch_all(&mut self, query: &QueryBuilder) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a statement and return the first result row within the transaction
    async fn fetch_optional(&mut self, query: &QueryBuilder) -> OrmResult<Option<Box<dyn DatabaseRow>>>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> OrmResult<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> OrmResult<()>;
}

/// Abstract database row trait
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue>;

    /// Get column names
    fn column_names(&self) -> Vec<String>;

    /// Convert row to a JSON object
    fn to_json(&self) -> OrmResult<JsonValue>;

    /// Convert row to HashMap
    fn to_map(&self) -> OrmResult<HashMap<String, DatabaseValue>> {
        self.column_names()
            .into_iter()
            .map(|name| {
                let value = self.get_by_name(&name)?;
                Ok((name, value))
            })
            .collect()
    }
}

/// Extension trait for DatabaseRow to support typed column access
pub trait DatabaseRowExt {
    /// Get a typed value from a column
    fn get<T>(&self, column: &str) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>;

    /// Try to get an optional typed value from a column; NULL and missing columns yield `None`
    fn try_get<T>(&self, column: &str) -> Result<Option<T>, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get<T>(&self, column: &str) -> Result<T, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let db_value = self.get_by_name(column)?;
        serde_json::from_value(db_value.to_json())
            .map_err(|e| ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e)))
    }

    fn try_get<T>(&self, column: &str) -> Result<Option<T>, ModelError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        if !self.column_names().iter().any(|name| name == column) {
            return Ok(None);
        }
        let db_value = self.get_by_name(column)?;
        if db_value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(db_value.to_json())
            .map(Some)
            .map_err(|e| ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e)))
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    NaiveDateTime(chrono::NaiveDateTime),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
    Json(JsonValue),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Convert to JSON value; timestamps come back in the storage format
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::from(*i),
            DatabaseValue::Int64(i) => JsonValue::from(*i),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.naive_utc().format(STORAGE_FORMAT).to_string()),
            DatabaseValue::NaiveDateTime(dt) => JsonValue::String(dt.format(STORAGE_FORMAT).to_string()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Time(t) => JsonValue::String(t.to_string()),
            DatabaseValue::Json(j) => j.clone(),
        }
    }

    /// Create DatabaseValue from JSON value
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        DatabaseValue::Int32(i as i32)
                    } else {
                        DatabaseValue::Int64(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float64(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => {
                if let Ok(uuid) = uuid::Uuid::parse_str(&s) {
                    DatabaseValue::Uuid(uuid)
                } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&s, STORAGE_FORMAT) {
                    DatabaseValue::NaiveDateTime(dt)
                } else if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                    DatabaseValue::DateTime(dt.with_timezone(&chrono::Utc))
                } else {
                    DatabaseValue::String(s)
                }
            }
            other => DatabaseValue::Json(other),
        }
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::from_json(value)
    }
}

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlDialect {
    PostgreSQL,
}

impl SqlDialect {
    /// Get the parameter placeholder for the zero-based parameter index
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::PostgreSQL => format!("${}", index + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_recognizes_storage_dates() {
        let value = DatabaseValue::from_json(json!("2024-03-01 10:20:30"));
        assert!(matches!(value, DatabaseValue::NaiveDateTime(_)));
        assert_eq!(value.to_json(), json!("2024-03-01 10:20:30"));
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(DatabaseValue::from_json(json!(5)), DatabaseValue::Int32(5));
        assert_eq!(DatabaseValue::from_json(json!(5_000_000_000i64)), DatabaseValue::Int64(5_000_000_000));
        assert_eq!(DatabaseValue::from_json(json!("plain")), DatabaseValue::String("plain".to_string()));
        assert!(DatabaseValue::from_json(JsonValue::Null).is_null());
        assert!(matches!(DatabaseValue::from_json(json!({"a": 1})), DatabaseValue::Json(_)));
    }

    #[test]
    fn test_rfc3339_to_storage_format() {
        let value = DatabaseValue::from_json(json!("2024-03-01T10:20:30+02:00"));
        assert_eq!(value.to_json(), json!("2024-03-01 08:20:30"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(SqlDialect::PostgreSQL.parameter_placeholder(0), "$1");
        assert_eq!(SqlDialect::PostgreSQL.parameter_placeholder(3), "$4");
    }
}
