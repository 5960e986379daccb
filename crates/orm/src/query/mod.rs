//! Query Builder Module - Fluent builder for the statements the model layer delegates to
//!
//! The builder is structured data: SQL backends render it through
//! `to_sql_with_params`, the in-memory backend interprets it directly.

pub mod builder;
pub mod dml;
pub mod ordering;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{OrderDirection, QueryOperator, QueryType, SetClause, WhereCondition};
