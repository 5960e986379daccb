//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use serde_json::Value;

impl QueryBuilder {
    fn push_condition(mut self, column: &str, operator: QueryOperator, value: Option<Value>, values: Vec<Value>) -> Self {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator,
            value,
            values,
        });
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::Equal, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::NotEqual, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::GreaterThan, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::GreaterThanOrEqual, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::LessThan, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::LessThanOrEqual, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with LIKE (`%` and `_` wildcards)
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(column, QueryOperator::Like, Some(Value::String(pattern.to_string())), Vec::new())
    }

    /// Add WHERE condition with NOT LIKE
    pub fn where_not_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(column, QueryOperator::NotLike, Some(Value::String(pattern.to_string())), Vec::new())
    }

    /// Add WHERE condition with a textual operator such as `">="` or `"like"`.
    ///
    /// Unknown operators fall back to equality.
    pub fn where_condition<T: Into<Value>>(self, column: &str, operator: &str, value: T) -> Self {
        let query_operator = QueryOperator::parse(operator).unwrap_or_else(|| {
            tracing::warn!("Unknown operator '{}' for column '{}', using '='", operator, column);
            QueryOperator::Equal
        });
        self.push_condition(column, query_operator, Some(value.into()), Vec::new())
    }

    /// Add WHERE condition with IN
    pub fn where_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_condition(column, QueryOperator::In, None, values)
    }

    /// Add WHERE condition with NOT IN
    pub fn where_not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_condition(column, QueryOperator::NotIn, None, values)
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNull, None, Vec::new())
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNotNull, None, Vec::new())
    }

    /// Add WHERE condition with BETWEEN
    pub fn where_between<T: Into<Value>>(self, column: &str, start: T, end: T) -> Self {
        self.push_condition(column, QueryOperator::Between, None, vec![start.into(), end.into()])
    }
}
