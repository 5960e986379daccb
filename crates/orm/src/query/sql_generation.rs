//! Query Builder SQL generation

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::SqlDialect;
use crate::error::{ModelError, ModelResult};

impl QueryBuilder {
    /// Generate SQL with dialect placeholders and the values to bind, in order
    pub fn to_sql_with_params(&self, dialect: &SqlDialect) -> ModelResult<(String, Vec<Value>)> {
        let table = self
            .table
            .as_deref()
            .ok_or_else(|| ModelError::Query("Statement has no target table".to_string()))?;

        let mut params = Vec::new();
        let sql = match self.query_type {
            QueryType::Select => self.build_select_sql(table, dialect, &mut params),
            QueryType::Count => self.build_count_sql(table, dialect, &mut params),
            QueryType::Insert => self.build_insert_sql(table, dialect, &mut params),
            QueryType::Update => self.build_update_sql(table, dialect, &mut params)?,
            QueryType::Delete => self.build_delete_sql(table, dialect, &mut params),
        };

        Ok((sql, params))
    }

    /// Render with PostgreSQL placeholders, mostly useful for logging
    pub fn to_sql(&self) -> ModelResult<String> {
        self.to_sql_with_params(&SqlDialect::PostgreSQL).map(|(sql, _)| sql)
    }

    fn build_select_sql(&self, table: &str, dialect: &SqlDialect, params: &mut Vec<Value>) -> String {
        let mut sql = String::from(if self.distinct { "SELECT DISTINCT " } else { "SELECT " });

        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select_fields.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(table);

        self.build_where_clause(&mut sql, dialect, params);
        self.build_order_limit_clause(&mut sql);
        sql
    }

    fn build_count_sql(&self, table: &str, dialect: &SqlDialect, params: &mut Vec<Value>) -> String {
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", table);
        self.build_where_clause(&mut sql, dialect, params);
        sql
    }

    fn build_insert_sql(&self, table: &str, dialect: &SqlDialect, params: &mut Vec<Value>) -> String {
        let mut sql = format!("INSERT INTO {}", table);

        if self.set_clauses.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let columns: Vec<&str> = self.set_clauses.iter().map(|c| c.column.as_str()).collect();
            let values: Vec<String> = self
                .set_clauses
                .iter()
                .map(|clause| push_param(dialect, params, &clause.value))
                .collect();
            sql.push_str(&format!(" ({}) VALUES ({})", columns.join(", "), values.join(", ")));
        }

        if !self.returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.returning.join(", "));
        }
        sql
    }

    fn build_update_sql(&self, table: &str, dialect: &SqlDialect, params: &mut Vec<Value>) -> ModelResult<String> {
        if self.set_clauses.is_empty() {
            return Err(ModelError::Query(format!("UPDATE on '{}' has no columns to set", table)));
        }

        let assignments: Vec<String> = self
            .set_clauses
            .iter()
            .map(|clause| format!("{} = {}", clause.column, push_param(dialect, params, &clause.value)))
            .collect();

        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        self.build_where_clause(&mut sql, dialect, params);
        Ok(sql)
    }

    fn build_delete_sql(&self, table: &str, dialect: &SqlDialect, params: &mut Vec<Value>) -> String {
        let mut sql = format!("DELETE FROM {}", table);
        self.build_where_clause(&mut sql, dialect, params);
        sql
    }

    /// Helper method to build WHERE clauses
    fn build_where_clause(&self, sql: &mut String, dialect: &SqlDialect, params: &mut Vec<Value>) {
        if self.where_conditions.is_empty() {
            return;
        }

        let conditions: Vec<String> = self
            .where_conditions
            .iter()
            .map(|condition| match condition.operator {
                QueryOperator::In | QueryOperator::NotIn => {
                    if condition.values.is_empty() {
                        // Empty IN never matches, empty NOT IN always does
                        return if condition.operator == QueryOperator::In {
                            "1 = 0".to_string()
                        } else {
                            "1 = 1".to_string()
                        };
                    }
                    let placeholders: Vec<String> = condition
                        .values
                        .iter()
                        .map(|value| push_param(dialect, params, value))
                        .collect();
                    format!("{} {} ({})", condition.column, condition.operator, placeholders.join(", "))
                }
                QueryOperator::Between => {
                    let start = condition.values.first().cloned().unwrap_or(Value::Null);
                    let end = condition.values.get(1).cloned().unwrap_or(Value::Null);
                    let start = push_param(dialect, params, &start);
                    let end = push_param(dialect, params, &end);
                    format!("{} BETWEEN {} AND {}", condition.column, start, end)
                }
                QueryOperator::IsNull | QueryOperator::IsNotNull => {
                    format!("{} {}", condition.column, condition.operator)
                }
                _ => match &condition.value {
                    Some(Value::Null) | None if condition.operator == QueryOperator::NotEqual => {
                        format!("{} IS NOT NULL", condition.column)
                    }
                    Some(Value::Null) | None => format!("{} IS NULL", condition.column),
                    Some(value) => format!(
                        "{} {} {}",
                        condition.column,
                        condition.operator,
                        push_param(dialect, params, value)
                    ),
                },
            })
            .collect();

        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    /// Helper method to build ORDER BY and LIMIT clauses
    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_clauses.join(", "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }
}

/// NULL is rendered inline, everything else becomes a bound parameter
fn push_param(dialect: &SqlDialect, params: &mut Vec<Value>, value: &Value) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    let placeholder = dialect.parameter_placeholder(params.len());
    params.push(value.clone());
    placeholder
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_with_conditions_and_ordering() {
        let query = QueryBuilder::table("users")
            .select("id, email")
            .where_eq("active", true)
            .where_gt("age", 18)
            .order_by_desc("created_at")
            .limit(10)
            .offset(20);

        let (sql, params) = query.to_sql_with_params(&SqlDialect::PostgreSQL).unwrap();
        assert_eq!(
            sql,
            "SELECT id, email FROM users WHERE active = $1 AND age > $2 ORDER BY created_at DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(params, vec![json!(true), json!(18)]);
    }

    #[test]
    fn test_in_list_placeholders() {
        let query = QueryBuilder::table("users").where_in("id", vec![1, 2, 3]);
        let (sql, params) = query.to_sql_with_params(&SqlDialect::PostgreSQL).unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_insert_with_returning() {
        let query = QueryBuilder::new()
            .insert_into("users")
            .set("email", "a@example.com")
            .set_null("nickname")
            .returning("id");

        let (sql, params) = query.to_sql_with_params(&SqlDialect::PostgreSQL).unwrap();
        assert_eq!(sql, "INSERT INTO users (email, nickname) VALUES ($1, NULL) RETURNING id");
        assert_eq!(params, vec![json!("a@example.com")]);
    }

    #[test]
    fn test_insert_without_columns_uses_default_values() {
        let sql = QueryBuilder::new().insert_into("audit_log").to_sql().unwrap();
        assert_eq!(sql, "INSERT INTO audit_log DEFAULT VALUES");
    }

    #[test]
    fn test_update_numbers_set_before_where() {
        let query = QueryBuilder::new()
            .update("users")
            .set("name", "Jane")
            .where_eq("id", 7);

        let (sql, params) = query.to_sql_with_params(&SqlDialect::PostgreSQL).unwrap();
        assert_eq!(sql, "UPDATE users SET name = $1 WHERE id = $2");
        assert_eq!(params, vec![json!("Jane"), json!(7)]);
    }

    #[test]
    fn test_update_without_columns_is_rejected() {
        let result = QueryBuilder::new().update("users").where_eq("id", 1).to_sql();
        assert!(matches!(result, Err(ModelError::Query(_))));
    }

    #[test]
    fn test_repeated_set_replaces_value() {
        let query = QueryBuilder::new().update("users").set("name", "a").set("name", "b");
        assert_eq!(query.set_clauses().len(), 1);
        assert_eq!(query.set_clauses()[0].value, json!("b"));
    }

    #[test]
    fn test_delete_and_count() {
        let sql = QueryBuilder::new().delete_from("users").where_null("verified_at").to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE verified_at IS NULL");

        let sql = QueryBuilder::table("users").where_eq("role", "admin").limit(5).count().to_sql().unwrap();
        assert_eq!(sql, "SELECT COUNT(*) AS count FROM users WHERE role = $1");
    }

    #[test]
    fn test_empty_in_list() {
        let values: Vec<i64> = Vec::new();
        let sql = QueryBuilder::table("users").where_in("id", values).to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE 1 = 0");
    }

    #[test]
    fn test_missing_table() {
        let result = QueryBuilder::new().select("*").to_sql();
        assert!(matches!(result, Err(ModelError::Query(_))));
    }

    #[test]
    fn test_paginate() {
        let sql = QueryBuilder::table("posts").paginate(15, 3).to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM posts LIMIT 15 OFFSET 30");

        let huge = QueryBuilder::table("posts").paginate(i64::MAX, i64::MAX);
        assert_eq!(huge.offset_value(), Some(i64::MAX));
        assert_eq!(QueryBuilder::table("posts").paginate(10, -4).offset_value(), Some(0));
    }
}
