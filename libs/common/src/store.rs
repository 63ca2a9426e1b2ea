//! Generic row store
//!
//! Tables hold JSON objects keyed by their `id` field. The console reads
//! profiles and leads through this interface and the identity service writes
//! provisioned profiles through it.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{Row as _, SqlitePool};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::{DatabaseError, StoreError, StoreResult};

/// One stored row
pub type Row = Map<String, Value>;

/// Equality filter applied by [`RowStore::select`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a `column = value` condition
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    /// Whether `row` satisfies every condition
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }

    fn id(&self) -> Option<&str> {
        self.conditions
            .iter()
            .find(|(column, _)| column == "id")
            .and_then(|(_, value)| value.as_str())
    }
}

/// Table/row persistence
///
/// `select` returns rows newest first. `delete` of a missing id is not an
/// error; `update` of a missing id is.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch every row of `table` matching `filter`
    async fn select(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Row>>;

    /// Insert a row, returning it with `id` and `created_at` filled in
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row>;

    /// Merge `patch` into the row with the given id
    async fn update(&self, table: &str, id: &str, patch: Row) -> StoreResult<Row>;

    /// Remove the row with the given id
    async fn delete(&self, table: &str, id: &str) -> StoreResult<()>;
}

/// Fill in `id` and `created_at` when the caller left them out.
fn prepare_row(mut row: Row) -> StoreResult<(String, String, Row)> {
    let id = match row.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        None | Some(Value::Null) => Uuid::new_v4().to_string(),
        Some(other) => {
            return Err(StoreError::InvalidRow(format!(
                "id must be a string or a number, got {}",
                other
            )));
        }
    };
    row.insert("id".to_string(), Value::String(id.clone()));

    let created_at = match row.get("created_at").and_then(Value::as_str) {
        Some(created_at) => created_at.to_string(),
        None => Utc::now().to_rfc3339(),
    };
    row.insert("created_at".to_string(), Value::String(created_at.clone()));

    Ok((id, created_at, row))
}

fn merge(row: &mut Row, patch: Row) {
    for (key, value) in patch {
        if key != "id" {
            row.insert(key, value);
        }
    }
}

/// Row store keeping each row as a JSON document in SQLite
#[derive(Clone)]
pub struct SqliteRowStore {
    pool: SqlitePool,
}

impl SqliteRowStore {
    /// Create a new row store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Row store schema ready");
        Ok(())
    }

    async fn fetch(&self, table: &str, id: &str) -> StoreResult<Option<Row>> {
        let row = sqlx::query("SELECT data FROM records WHERE collection = ?1 AND id = ?2")
            .bind(table)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RowStore for SqliteRowStore {
    async fn select(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Row>> {
        let rows = match filter.id() {
            Some(id) => {
                sqlx::query("SELECT data FROM records WHERE collection = ?1 AND id = ?2")
                    .bind(table)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT data FROM records
                    WHERE collection = ?1
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .bind(table)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.get("data");
            let decoded: Row = serde_json::from_str(&data)?;
            if filter.matches(&decoded) {
                out.push(decoded);
            }
        }
        Ok(out)
    }

    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row> {
        let (id, created_at, row) = prepare_row(row)?;
        let data = serde_json::to_string(&row)?;

        sqlx::query(
            "INSERT INTO records (collection, id, data, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(table)
        .bind(&id)
        .bind(&data)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> StoreResult<Row> {
        let mut row = self
            .fetch(table, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;
        merge(&mut row, patch);

        sqlx::query("UPDATE records SET data = ?1 WHERE collection = ?2 AND id = ?3")
            .bind(serde_json::to_string(&row)?)
            .bind(table)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(row)
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM records WHERE collection = ?1 AND id = ?2")
            .bind(table)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-process row store, mostly for tests
#[derive(Default)]
pub struct MemoryRowStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    unavailable: AtomicBool,
}

impl MemoryRowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of rows currently stored in `table`
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Vec::len)
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn select(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Row>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .rev()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row> {
        self.check()?;
        let (id, _, row) = prepare_row(row)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str())) {
            return Err(StoreError::InvalidRow(format!("duplicate id {}", id)));
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> StoreResult<Row> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;
        merge(row, patch);
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<()> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DatabaseConfig, init_pool};
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    async fn sqlite_store() -> SqliteRowStore {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        let store = SqliteRowStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_sqlite_insert_select_by_id() {
        let store = sqlite_store().await;
        store
            .insert("profiles", row(json!({"id": "u-1", "role": "admin"})))
            .await
            .unwrap();
        store
            .insert("profiles", row(json!({"id": "u-2", "role": "editor"})))
            .await
            .unwrap();

        let rows = store
            .select("profiles", &Filter::all().eq("id", "u-2"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["role"], json!("editor"));
    }

    #[tokio::test]
    async fn test_sqlite_generates_id_and_orders_newest_first() {
        let store = sqlite_store().await;
        let first = store
            .insert("leads", row(json!({"status": "new", "created_at": "2024-01-01T00:00:00Z"})))
            .await
            .unwrap();
        store
            .insert("leads", row(json!({"status": "contacted", "created_at": "2024-02-01T00:00:00Z"})))
            .await
            .unwrap();

        assert!(first["id"].as_str().is_some());

        let rows = store.select("leads", &Filter::all()).await.unwrap();
        assert_eq!(rows[0]["status"], json!("contacted"));
        assert_eq!(rows[1]["status"], json!("new"));

        let new_only = store
            .select("leads", &Filter::all().eq("status", "new"))
            .await
            .unwrap();
        assert_eq!(new_only.len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_update_and_delete() {
        let store = sqlite_store().await;
        store
            .insert("faqs", row(json!({"id": "f1", "question": "Why?"})))
            .await
            .unwrap();

        let updated = store
            .update("faqs", "f1", row(json!({"question": "How?", "id": "ignored"})))
            .await
            .unwrap();
        assert_eq!(updated["question"], json!("How?"));
        assert_eq!(updated["id"], json!("f1"));

        store.delete("faqs", "f1").await.unwrap();
        assert!(store.select("faqs", &Filter::all()).await.unwrap().is_empty());

        let missing = store.update("faqs", "f1", Row::new()).await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_memory_store_unavailable() {
        let store = MemoryRowStore::new();
        store.set_unavailable(true);
        let result = store.select("profiles", &Filter::all()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_memory_store_rejects_duplicate_id() {
        let store = MemoryRowStore::new();
        store.insert("t", row(json!({"id": "a"}))).await.unwrap();
        assert!(store.insert("t", row(json!({"id": "a"}))).await.is_err());
        assert_eq!(store.len("t").await, 1);
    }
}
