//! Query Builder DML operations (INSERT, UPDATE, DELETE)

use super::builder::QueryBuilder;
use super::types::*;
use serde_json::Value;

impl QueryBuilder {
    /// Start an INSERT query
    pub fn insert_into(mut self, table: &str) -> Self {
        self.query_type = QueryType::Insert;
        self.table = Some(table.to_string());
        self
    }

    /// Start an UPDATE query
    pub fn update(mut self, table: &str) -> Self {
        self.query_type = QueryType::Update;
        self.table = Some(table.to_string());
        self
    }

    /// Start a DELETE query; without conditions it removes every row
    pub fn delete_from(mut self, table: &str) -> Self {
        self.query_type = QueryType::Delete;
        self.table = Some(table.to_string());
        self
    }

    /// Set a column value (for INSERT/UPDATE), replacing an earlier value for the same column
    pub fn set<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        let value = value.into();
        match self.set_clauses.iter_mut().find(|clause| clause.column == column) {
            Some(clause) => clause.value = value,
            None => self.set_clauses.push(SetClause {
                column: column.to_string(),
                value,
            }),
        }
        self
    }

    /// Set a column to NULL (for INSERT/UPDATE)
    pub fn set_null(self, column: &str) -> Self {
        self.set(column, Value::Null)
    }

    /// Set multiple values at once
    pub fn set_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (column, value) in values {
            self = self.set(&column, value);
        }
        self
    }

    /// Columns to hand back from an INSERT (`RETURNING`)
    pub fn returning(mut self, columns: &str) -> Self {
        self.returning = columns
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }
}
