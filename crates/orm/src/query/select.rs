//! Query Builder SELECT operations

use super::builder::QueryBuilder;
use super::types::QueryType;

impl QueryBuilder {
    /// Add SELECT fields to the query
    pub fn select(mut self, fields: &str) -> Self {
        self.query_type = QueryType::Select;
        if fields.trim() == "*" {
            self.select_fields.clear();
        } else {
            self.select_fields.extend(
                fields
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty()),
            );
        }
        self
    }

    /// Add SELECT DISTINCT to the query
    pub fn select_distinct(mut self, fields: &str) -> Self {
        self.distinct = true;
        self.select(fields)
    }

    /// Set the source table
    pub fn from(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Turn the query into `SELECT COUNT(*) AS count`
    pub fn count(mut self) -> Self {
        self.query_type = QueryType::Count;
        self.select_fields.clear();
        self.order_by.clear();
        self.limit_count = None;
        self.offset_value = None;
        self
    }
}
