//! In-memory backend
//!
//! Interprets `QueryBuilder` statements against tables held in process
//! memory. Every statement is rendered to SQL and recorded, which makes
//! the backend useful for asserting how many round trips an operation made.
//! Transactions work on a private snapshot and replay their writes onto the
//! shared tables on commit. Key sequences live outside the snapshots and are
//! never rewound, like PostgreSQL sequences.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::core::*;
use crate::error::{OrmError, OrmResult};
use crate::query::{OrderDirection, QueryBuilder, QueryOperator, QueryType, WhereCondition};
use crate::transaction::TransactionConfig;

type JsonRow = Map<String, JsonValue>;

#[derive(Debug, Clone, Default)]
struct MemoryStore {
    tables: HashMap<String, Vec<JsonRow>>,
}

#[derive(Debug, Clone)]
struct TableSchema {
    primary_key: String,
    auto_increment: bool,
    defaults: JsonRow,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            auto_increment: true,
            defaults: JsonRow::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    store: Mutex<MemoryStore>,
    schemas: RwLock<HashMap<String, TableSchema>>,
    sequences: Mutex<HashMap<String, i64>>,
    statements: Mutex<Vec<String>>,
}

/// Result of applying one statement
struct Outcome {
    affected: u64,
    rows: Vec<JsonRow>,
    /// Equivalent statement for replaying the change elsewhere; inserts carry the stored row
    replay: Option<QueryBuilder>,
}

/// In-memory connection pool
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    inner: Arc<MemoryInner>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the primary key column of a table (defaults to an auto-incrementing `id`)
    pub fn with_primary_key(self, table: &str, column: &str, auto_increment: bool) -> Self {
        {
            let mut schemas = self.inner.schemas.write();
            let schema = schemas.entry(table.to_string()).or_default();
            schema.primary_key = column.to_string();
            schema.auto_increment = auto_increment;
        }
        self
    }

    /// Declare a server-side column default, applied on insert when the column is absent
    pub fn with_default<V: Into<JsonValue>>(self, table: &str, column: &str, value: V) -> Self {
        self.inner
            .schemas
            .write()
            .entry(table.to_string())
            .or_default()
            .defaults
            .insert(column.to_string(), value.into());
        self
    }

    /// Every statement received so far, rendered as PostgreSQL
    pub fn statements(&self) -> Vec<String> {
        self.inner.statements.lock().clone()
    }

    pub fn statement_count(&self) -> usize {
        self.inner.statements.lock().len()
    }

    pub fn clear_statements(&self) {
        self.inner.statements.lock().clear();
    }

    /// Committed rows of a table, in insertion order
    pub fn rows(&self, table: &str) -> Vec<JsonRow> {
        self.inner.store.lock().tables.get(table).cloned().unwrap_or_default()
    }

    fn record(&self, query: &QueryBuilder) {
        let sql = query
            .to_sql()
            .unwrap_or_else(|e| format!("<unrenderable statement: {}>", e));
        debug!("memory: {}", sql);
        self.inner.statements.lock().push(sql);
    }

    fn apply_to(&self, store: &mut MemoryStore, query: &QueryBuilder) -> OrmResult<Outcome> {
        let schemas = self.inner.schemas.read();
        let mut sequences = self.inner.sequences.lock();
        apply(store, &schemas, &mut sequences, query)
    }

    fn run(&self, store: &mut MemoryStore, query: &QueryBuilder) -> OrmResult<Outcome> {
        self.record(query);
        self.apply_to(store, query)
    }

    fn run_shared(&self, query: &QueryBuilder) -> OrmResult<Outcome> {
        let mut store = self.inner.store.lock();
        self.run(&mut store, query)
    }
}

#[async_trait]
impl DatabasePool for MemoryPool {
    async fn execute(&self, query: &QueryBuilder) -> OrmResult<u64> {
        Ok(self.run_shared(query)?.affected)
    }

    async fn fetch_all(&self, query: &QueryBuilder) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        Ok(into_rows(self.run_shared(query)?.rows))
    }

    async fn fetch_optional(&self, query: &QueryBuilder) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        Ok(into_rows(self.run_shared(query)?.rows).into_iter().next())
    }

    async fn begin_transaction(&self, config: &TransactionConfig) -> OrmResult<Box<dyn DatabaseTransaction>> {
        debug!("memory: BEGIN ({:?})", config.isolation_level);
        let snapshot = self.inner.store.lock().clone();
        Ok(Box::new(MemoryTransaction {
            pool: self.clone(),
            snapshot: Some(snapshot),
            writes: Vec::new(),
        }))
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    async fn close(&self) -> OrmResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> OrmResult<std::time::Duration> {
        let start = Instant::now();
        drop(self.inner.store.lock());
        Ok(start.elapsed())
    }
}

/// Snapshot-based transaction over a `MemoryPool`
pub struct MemoryTransaction {
    pool: MemoryPool,
    snapshot: Option<MemoryStore>,
    writes: Vec<QueryBuilder>,
}

impl MemoryTransaction {
    fn run(&mut self, query: &QueryBuilder) -> OrmResult<Outcome> {
        let snapshot = self
            .snapshot
            .as_mut()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))?;
        let outcome = self.pool.run(snapshot, query)?;
        if let Some(replay) = &outcome.replay {
            self.writes.push(replay.clone());
        }
        Ok(outcome)
    }
}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn execute(&mut self, query: &QueryBuilder) -> OrmResult<u64> {
        Ok(self.run(query)?.affected)
    }

    async fn fetch_all(&mut self, query: &QueryBuilder) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        Ok(into_rows(self.run(query)?.rows))
    }

    async fn fetch_optional(&mut self, query: &QueryBuilder) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        Ok(into_rows(self.run(query)?.rows).into_iter().next())
    }

    async fn commit(mut self: Box<Self>) -> OrmResult<()> {
        self.snapshot
            .take()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))?;

        // All or nothing: replay onto a copy and swap it in only if every write applies
        let mut store = self.pool.inner.store.lock();
        let mut next = store.clone();
        for write in &self.writes {
            self.pool.apply_to(&mut next, write)?;
        }
        *store = next;
        debug!("memory: COMMIT ({} writes)", self.writes.len());
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> OrmResult<()> {
        self.snapshot
            .take()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))?;
        debug!("memory: ROLLBACK");
        Ok(())
    }
}

/// Row produced by the in-memory backend
#[derive(Debug, Clone)]
pub struct MemoryRow {
    columns: JsonRow,
}

impl MemoryRow {
    pub fn new(columns: JsonRow) -> Self {
        Self { columns }
    }
}

impl DatabaseRow for MemoryRow {
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        self.columns
            .get(name)
            .cloned()
            .map(DatabaseValue::from_json)
            .ok_or_else(|| OrmError::Query(format!("Column '{}' not found", name)))
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    fn to_json(&self) -> OrmResult<JsonValue> {
        Ok(JsonValue::Object(self.columns.clone()))
    }
}

fn into_rows(rows: Vec<JsonRow>) -> Vec<Box<dyn DatabaseRow>> {
    rows.into_iter()
        .map(|row| Box::new(MemoryRow::new(row)) as Box<dyn DatabaseRow>)
        .collect()
}

fn duplicate_key(table: &str, column: &str, key: &JsonValue) -> OrmError {
    OrmError::Database(format!(
        "duplicate key value violates unique constraint: {}.{} = {}",
        table, column, key
    ))
}

fn apply(
    store: &mut MemoryStore,
    schemas: &HashMap<String, TableSchema>,
    sequences: &mut HashMap<String, i64>,
    query: &QueryBuilder,
) -> OrmResult<Outcome> {
    let table_name = query
        .table_name()
        .ok_or_else(|| OrmError::Query("Statement has no target table".to_string()))?;
    let schema = schemas.get(table_name).cloned().unwrap_or_default();
    let pk = schema.primary_key.as_str();
    let rows = store.tables.entry(table_name.to_string()).or_default();

    match query.query_type() {
        QueryType::Select => {
            let mut selected: Vec<JsonRow> = rows
                .iter()
                .filter(|row| matches_all(row, query.where_conditions()))
                .cloned()
                .collect();

            sort_rows(&mut selected, query.order_clauses());
            if query.is_distinct() {
                let mut seen: Vec<JsonRow> = Vec::new();
                for row in selected.iter().map(|r| project(r, query.select_fields())) {
                    if !seen.contains(&row) {
                        seen.push(row);
                    }
                }
                selected = seen;
            }

            let offset = query.offset_value().unwrap_or(0).max(0) as usize;
            let limit = query.limit_count().map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
            let selected: Vec<JsonRow> = selected
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|row| project(&row, query.select_fields()))
                .collect();

            Ok(Outcome { affected: selected.len() as u64, rows: selected, replay: None })
        }
        QueryType::Count => {
            let count = rows
                .iter()
                .filter(|row| matches_all(row, query.where_conditions()))
                .count();
            let mut row = JsonRow::new();
            row.insert("count".to_string(), JsonValue::from(count as i64));
            Ok(Outcome { affected: 1, rows: vec![row], replay: None })
        }
        QueryType::Insert => {
            let mut row = JsonRow::new();
            for clause in query.set_clauses() {
                row.insert(clause.column.clone(), clause.value.clone());
            }
            for (column, value) in &schema.defaults {
                row.entry(column.clone()).or_insert_with(|| value.clone());
            }

            let sequence = sequences.entry(table_name.to_string()).or_insert(0);
            match row.get(pk).cloned() {
                Some(JsonValue::Null) | None if schema.auto_increment => {
                    *sequence += 1;
                    row.insert(pk.to_string(), JsonValue::from(*sequence));
                }
                Some(JsonValue::Null) | None => {
                    return Err(OrmError::Database(format!(
                        "null value in column '{}' of relation '{}' violates not-null constraint",
                        pk, table_name
                    )));
                }
                Some(key) => {
                    if rows.iter().any(|existing| existing.get(pk) == Some(&key)) {
                        return Err(duplicate_key(table_name, pk, &key));
                    }
                    if let Some(n) = key.as_i64() {
                        *sequence = (*sequence).max(n);
                    }
                }
            }

            rows.push(row.clone());
            let returned = if query.returning_columns().is_empty() {
                Vec::new()
            } else {
                vec![project(&row, query.returning_columns())]
            };
            let replay = QueryBuilder::new().insert_into(table_name).set_values(row);
            Ok(Outcome { affected: 1, rows: returned, replay: Some(replay) })
        }
        QueryType::Update => {
            let conditions = query.where_conditions();
            let new_key = query
                .set_clauses()
                .iter()
                .rev()
                .find(|clause| clause.column == pk)
                .map(|clause| clause.value.clone());

            if let Some(key) = &new_key {
                let targeted = rows.iter().filter(|row| matches_all(row, conditions)).count();
                let taken = rows
                    .iter()
                    .any(|row| !matches_all(row, conditions) && row.get(pk) == Some(key));
                if taken || targeted > 1 {
                    return Err(duplicate_key(table_name, pk, key));
                }
            }

            let mut affected = 0;
            for row in rows.iter_mut().filter(|row| matches_all(row, conditions)) {
                for clause in query.set_clauses() {
                    row.insert(clause.column.clone(), clause.value.clone());
                }
                affected += 1;
            }
            Ok(Outcome { affected, rows: Vec::new(), replay: Some(query.clone()) })
        }
        QueryType::Delete => {
            let before = rows.len();
            rows.retain(|row| !matches_all(row, query.where_conditions()));
            Ok(Outcome {
                affected: (before - rows.len()) as u64,
                rows: Vec::new(),
                replay: Some(query.clone()),
            })
        }
    }
}

fn project(row: &JsonRow, fields: &[String]) -> JsonRow {
    if fields.is_empty() || fields.iter().any(|f| f == "*") {
        return row.clone();
    }
    fields
        .iter()
        .map(|field| (field.clone(), row.get(field).cloned().unwrap_or(JsonValue::Null)))
        .collect()
}

fn matches_all(row: &JsonRow, conditions: &[WhereCondition]) -> bool {
    conditions.iter().all(|condition| matches_condition(row, condition))
}

fn matches_condition(row: &JsonRow, condition: &WhereCondition) -> bool {
    let actual = row.get(&condition.column).unwrap_or(&JsonValue::Null);
    let expected = condition.value.as_ref().unwrap_or(&JsonValue::Null);

    match condition.operator {
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
        QueryOperator::Equal if expected.is_null() => actual.is_null(),
        QueryOperator::Equal => compare(actual, expected) == Some(Ordering::Equal),
        QueryOperator::NotEqual if expected.is_null() => !actual.is_null(),
        QueryOperator::NotEqual => matches!(compare(actual, expected), Some(o) if o != Ordering::Equal),
        QueryOperator::GreaterThan => compare(actual, expected) == Some(Ordering::Greater),
        QueryOperator::GreaterThanOrEqual => matches!(compare(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
        QueryOperator::LessThan => compare(actual, expected) == Some(Ordering::Less),
        QueryOperator::LessThanOrEqual => matches!(compare(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        QueryOperator::Like | QueryOperator::NotLike => {
            let matched = match (as_text(actual), expected.as_str()) {
                (Some(text), Some(pattern)) => like_match(&text, pattern),
                _ => return false,
            };
            matched == (condition.operator == QueryOperator::Like)
        }
        QueryOperator::In => condition.values.iter().any(|v| compare(actual, v) == Some(Ordering::Equal)),
        QueryOperator::NotIn => {
            !actual.is_null() && condition.values.iter().all(|v| compare(actual, v) != Some(Ordering::Equal))
        }
        QueryOperator::Between => match (condition.values.first(), condition.values.get(1)) {
            (Some(start), Some(end)) => {
                matches!(compare(actual, start), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(actual, end), Some(Ordering::Less | Ordering::Equal))
            }
            _ => false,
        },
    }
}

/// SQL-ish comparison: NULL compares to nothing, numbers compare numerically
fn compare(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
    match (left, right) {
        (JsonValue::Null, _) | (_, JsonValue::Null) => None,
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        (JsonValue::Number(n), JsonValue::String(s)) => n.as_f64()?.partial_cmp(&s.parse::<f64>().ok()?),
        (JsonValue::String(s), JsonValue::Number(n)) => s.parse::<f64>().ok()?.partial_cmp(&n.as_f64()?),
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Case-sensitive LIKE with `%` and `_` wildcards
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let mut matches = vec![vec![false; pattern.len() + 1]; text.len() + 1];
    matches[0][0] = true;

    for j in 1..=pattern.len() {
        if pattern[j - 1] == '%' {
            matches[0][j] = matches[0][j - 1];
        }
    }

    for i in 1..=text.len() {
        for j in 1..=pattern.len() {
            matches[i][j] = match pattern[j - 1] {
                '%' => matches[i][j - 1] || matches[i - 1][j],
                '_' => matches[i - 1][j - 1],
                c => matches[i - 1][j - 1] && c == text[i - 1],
            };
        }
    }

    matches[text.len()][pattern.len()]
}

fn sort_rows(rows: &mut [JsonRow], order: &[(String, OrderDirection)]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for (column, direction) in order {
            let left = a.get(column).unwrap_or(&JsonValue::Null);
            let right = b.get(column).unwrap_or(&JsonValue::Null);
            // NULLs sort last in both directions
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                _ => compare(left, right).unwrap_or(Ordering::Equal),
            };
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn insert(name: &str, age: i64) -> QueryBuilder {
        QueryBuilder::new()
            .insert_into("users")
            .set("name", name)
            .set("age", age)
            .returning("id")
    }

    #[tokio::test]
    async fn test_insert_assigns_incrementing_ids() {
        let pool = MemoryPool::new();
        let first = pool.fetch_optional(&insert("Alice", 30)).await.unwrap().unwrap();
        let second = pool.fetch_optional(&insert("Bob", 25)).await.unwrap().unwrap();

        assert_eq!(first.to_json().unwrap(), json!({"id": 1}));
        assert_eq!(second.to_json().unwrap(), json!({"id": 2}));
        assert_eq!(pool.rows("users").len(), 2);
        assert_eq!(pool.statement_count(), 2);
    }

    #[tokio::test]
    async fn test_defaults_and_duplicate_keys() {
        let pool = MemoryPool::new().with_default("users", "status", "active");
        pool.execute(&insert("Alice", 30)).await.unwrap();
        assert_eq!(pool.rows("users")[0].get("status"), Some(&json!("active")));

        let duplicate = QueryBuilder::new().insert_into("users").set("id", 1).set("name", "Eve");
        let err = pool.execute(&duplicate).await.unwrap_err();
        assert!(matches!(err, OrmError::Database(_)));
    }

    #[tokio::test]
    async fn test_select_filters_sorts_and_limits() {
        let pool = MemoryPool::new();
        for (name, age) in [("Alice", 30), ("Bob", 25), ("Carol", 41), ("Dave", 19)] {
            pool.execute(&insert(name, age)).await.unwrap();
        }

        let query = QueryBuilder::table("users")
            .select("name")
            .where_gte("age", 20)
            .order_by_desc("age")
            .limit(2);
        let rows = pool.fetch_all(&query).await.unwrap();
        let names: Vec<JsonValue> = rows.iter().map(|r| r.to_json().unwrap()["name"].clone()).collect();
        assert_eq!(names, vec![json!("Carol"), json!("Alice")]);

        let count = pool
            .fetch_optional(&QueryBuilder::table("users").where_like("name", "%a%").count())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count.get::<i64>("count").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_negated_conditions_and_distinct() {
        let pool = MemoryPool::new();
        for (name, age) in [("Alice", 30), ("Bob", 30), ("Carol", 41)] {
            pool.execute(&insert(name, age)).await.unwrap();
        }
        pool.execute(&QueryBuilder::new().insert_into("users").set("name", "Nobody"))
            .await
            .unwrap();

        let names = |rows: Vec<Box<dyn DatabaseRow>>| -> Vec<JsonValue> {
            rows.iter().map(|r| r.to_json().unwrap()["name"].clone()).collect()
        };

        let query = QueryBuilder::table("users").where_not_in("name", vec!["Alice"]).where_ne("age", JsonValue::Null);
        assert_eq!(names(pool.fetch_all(&query).await.unwrap()), vec![json!("Bob"), json!("Carol")]);

        let query = QueryBuilder::table("users").where_not_like("name", "%o%").where_condition("age", "<=", 40);
        assert_eq!(names(pool.fetch_all(&query).await.unwrap()), vec![json!("Alice")]);

        let ages = pool
            .fetch_all(&QueryBuilder::table("users").select_distinct("age").where_not_null("age"))
            .await
            .unwrap();
        assert_eq!(ages.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_affected_rows() {
        let pool = MemoryPool::new();
        pool.execute(&insert("Alice", 30)).await.unwrap();
        pool.execute(&insert("Bob", 25)).await.unwrap();

        let update = QueryBuilder::new().update("users").set("age", 31).where_eq("name", "Alice");
        assert_eq!(pool.execute(&update).await.unwrap(), 1);

        let delete = QueryBuilder::new().delete_from("users").where_in("id", vec![1, 2, 3]);
        assert_eq!(pool.execute(&delete).await.unwrap(), 2);
        assert!(pool.rows("users").is_empty());
    }

    #[tokio::test]
    async fn test_transaction_commit_and_rollback() {
        let pool = MemoryPool::new();
        let config = TransactionConfig::default();

        let mut tx = pool.begin_transaction(&config).await.unwrap();
        tx.execute(&insert("Alice", 30)).await.unwrap();
        assert!(pool.rows("users").is_empty());
        tx.rollback().await.unwrap();
        assert!(pool.rows("users").is_empty());

        let mut tx = pool.begin_transaction(&config).await.unwrap();
        tx.execute(&insert("Bob", 25)).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(pool.rows("users").len(), 1);
    }

    #[tokio::test]
    async fn test_commit_keeps_writes_made_outside_the_transaction() {
        let pool = MemoryPool::new();
        pool.execute(&insert("Alice", 30)).await.unwrap();

        let mut tx = pool.begin_transaction(&TransactionConfig::default()).await.unwrap();
        tx.execute(&insert("Bob", 25)).await.unwrap();
        tx.execute(&QueryBuilder::new().update("users").set("age", 31).where_eq("name", "Alice"))
            .await
            .unwrap();
        pool.execute(&insert("Carol", 41)).await.unwrap();
        tx.commit().await.unwrap();

        let rows = pool.rows("users");
        let ids: Vec<JsonValue> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(3), json!(2)]);
        assert_eq!(rows[0]["age"], json!(31));
    }

    #[tokio::test]
    async fn test_conflicting_commit_leaves_tables_untouched() {
        let pool = MemoryPool::new();
        let mut tx = pool.begin_transaction(&TransactionConfig::default()).await.unwrap();
        tx.execute(&QueryBuilder::new().insert_into("users").set("id", 5).set("name", "Tx"))
            .await
            .unwrap();
        tx.execute(&insert("Also tx", 20)).await.unwrap();
        pool.execute(&QueryBuilder::new().insert_into("users").set("id", 5).set("name", "Outside"))
            .await
            .unwrap();

        assert!(matches!(tx.commit().await, Err(OrmError::Database(_))));
        let rows = pool.rows("users");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Outside"));
    }

    #[tokio::test]
    async fn test_sequences_are_not_rewound() {
        let pool = MemoryPool::new();
        pool.execute(&insert("Alice", 30)).await.unwrap();
        pool.execute(&QueryBuilder::new().delete_from("users")).await.unwrap();

        let row = pool.fetch_optional(&insert("Bob", 25)).await.unwrap().unwrap();
        assert_eq!(row.to_json().unwrap(), json!({"id": 2}));

        let mut tx = pool.begin_transaction(&TransactionConfig::default()).await.unwrap();
        tx.execute(&insert("Rolled back", 1)).await.unwrap();
        tx.rollback().await.unwrap();
        let row = pool.fetch_optional(&insert("Carol", 41)).await.unwrap().unwrap();
        assert_eq!(row.to_json().unwrap(), json!({"id": 4}));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_primary_key() {
        let pool = MemoryPool::new();
        pool.execute(&insert("Alice", 30)).await.unwrap();
        pool.execute(&insert("Bob", 25)).await.unwrap();

        let moved = QueryBuilder::new().update("users").set("id", 1).where_eq("id", 2);
        assert!(matches!(pool.execute(&moved).await, Err(OrmError::Database(_))));
        let collapse = QueryBuilder::new().update("users").set("id", 9);
        assert!(matches!(pool.execute(&collapse).await, Err(OrmError::Database(_))));

        let ids: Vec<JsonValue> = pool.rows("users").iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);

        let free = QueryBuilder::new().update("users").set("id", 7).where_eq("id", 2);
        assert_eq!(pool.execute(&free).await.unwrap(), 1);
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("alice@example.com", "%@example.com"));
        assert!(like_match("abc", "a_c"));
        assert!(!like_match("abc", "a_"));
        assert!(like_match("", "%"));
        assert!(!like_match("Alice", "alice"));
    }

    #[test]
    fn test_compare_null_semantics() {
        assert_eq!(compare(&json!(null), &json!(1)), None);
        assert_eq!(compare(&json!(2), &json!(2.0)), Some(Ordering::Equal));
        assert_eq!(compare(&json!("7"), &json!(7)), Some(Ordering::Equal));
    }
}
