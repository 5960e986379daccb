//! Query Builder - Core builder implementation

use super::types::*;

/// Query builder for constructing database statements
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    pub(crate) query_type: QueryType,
    pub(crate) table: Option<String>,
    pub(crate) select_fields: Vec<String>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) distinct: bool,
    pub(crate) returning: Vec<String>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self {
            query_type: QueryType::Select,
            table: None,
            select_fields: Vec::new(),
            set_clauses: Vec::new(),
            where_conditions: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            distinct: false,
            returning: Vec::new(),
        }
    }

    /// Shorthand for `QueryBuilder::new().from(table)`
    pub fn table(table: &str) -> Self {
        Self::new().from(table)
    }

    pub fn query_type(&self) -> &QueryType {
        &self.query_type
    }

    /// Target table of the statement, whatever its type
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }

    pub fn set_clauses(&self) -> &[SetClause] {
        &self.set_clauses
    }

    pub fn where_conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }

    pub fn order_clauses(&self) -> &[(String, OrderDirection)] {
        &self.order_by
    }

    pub fn limit_count(&self) -> Option<i64> {
        self.limit_count
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset_value
    }

    pub fn returning_columns(&self) -> &[String] {
        &self.returning
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }
}
