//! Structured pieces of a statement: operators, conditions and assignments

use std::fmt;

use serde_json::Value;

/// Comparison used by a WHERE condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
}

const BINARY_OPERATORS: &[(&str, QueryOperator)] = &[
    ("=", QueryOperator::Equal),
    ("!=", QueryOperator::NotEqual),
    ("<>", QueryOperator::NotEqual),
    (">", QueryOperator::GreaterThan),
    (">=", QueryOperator::GreaterThanOrEqual),
    ("<", QueryOperator::LessThan),
    ("<=", QueryOperator::LessThanOrEqual),
    ("LIKE", QueryOperator::Like),
    ("NOT LIKE", QueryOperator::NotLike),
];

impl QueryOperator {
    /// Parse a textual comparison taking a single right-hand value
    pub fn parse(operator: &str) -> Option<Self> {
        let wanted = operator.trim().to_uppercase();
        BINARY_OPERATORS
            .iter()
            .find(|(text, _)| *text == wanted)
            .map(|(_, op)| *op)
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            QueryOperator::Equal => "=",
            QueryOperator::NotEqual => "!=",
            QueryOperator::GreaterThan => ">",
            QueryOperator::GreaterThanOrEqual => ">=",
            QueryOperator::LessThan => "<",
            QueryOperator::LessThanOrEqual => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::NotLike => "NOT LIKE",
            QueryOperator::In => "IN",
            QueryOperator::NotIn => "NOT IN",
            QueryOperator::IsNull => "IS NULL",
            QueryOperator::IsNotNull => "IS NOT NULL",
            QueryOperator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One WHERE condition; conditions on a builder are joined with AND
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub column: String,
    pub operator: QueryOperator,
    /// Right-hand value of a binary comparison
    pub value: Option<Value>,
    /// Operands of IN, NOT IN and BETWEEN
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        })
    }
}

/// Statement kinds the builder can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

/// Column assignment of an INSERT or UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: String,
    pub value: Value,
}
