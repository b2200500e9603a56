use crate::stores::table_store::{Filter, Row, StoreError, StoreResult, TableStore};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory table store
///
/// Rows are kept per table in insertion order. Used as the `memory` backend
/// for local development and by the handler tests.
pub struct MemoryTableStore {
    tables: DashMap<String, Vec<Row>>,
    /// Columns that reject duplicate values on insert, keyed by table
    unique_columns: HashMap<String, String>,
    next_id: AtomicU64,
}

impl MemoryTableStore {
    /// Create an empty store with no unique constraints
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            unique_columns: HashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Declare `column` unique for inserts into `table`
    pub fn with_unique_column(mut self, table: &str, column: &str) -> Self {
        self.unique_columns
            .insert(table.to_string(), column.to_string());
        self
    }

    /// Number of rows currently held in `table`
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn assign_id(&self, row: &mut Row) {
        if !row.contains_key("id") {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            row.insert("id".to_string(), Value::from(id));
        }
    }
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key_filter(row: &Row, column: &str) -> Option<Filter> {
    match row.get(column)? {
        Value::String(s) => Some(Filter::eq(column, s.clone())),
        Value::Null => None,
        other => Some(Filter::eq(column, other.to_string())),
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn insert(&self, table: &str, mut row: Row) -> StoreResult<Vec<Row>> {
        let mut rows = self.tables.entry(table.to_string()).or_default();

        if let Some(column) = self.unique_columns.get(table) {
            if let Some(filter) = key_filter(&row, column) {
                if rows.iter().any(|existing| filter.matches(existing)) {
                    return Err(StoreError::Remote {
                        status: 409,
                        message: format!(
                            "duplicate key value violates unique constraint \"{}_{}_key\"",
                            table, column
                        ),
                    });
                }
            }
        }

        self.assign_id(&mut row);
        rows.push(row.clone());
        Ok(vec![row])
    }

    async fn upsert(&self, table: &str, mut row: Row, on_conflict: &str) -> StoreResult<Vec<Row>> {
        let Some(filter) = key_filter(&row, on_conflict) else {
            return Err(StoreError::Remote {
                status: 400,
                message: format!("null value in column \"{}\" violates not-null constraint", on_conflict),
            });
        };

        let mut rows = self.tables.entry(table.to_string()).or_default();

        // Last write wins: supplied fields replace the stored ones
        if let Some(existing) = rows.iter_mut().find(|existing| filter.matches(existing)) {
            existing.extend(row);
            return Ok(vec![existing.clone()]);
        }

        self.assign_id(&mut row);
        rows.push(row.clone());
        Ok(vec![row])
    }

    async fn select(&self, table: &str, filter: Option<&Filter>) -> StoreResult<Vec<Row>> {
        let Some(rows) = self.tables.get(table) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .iter()
            .filter(|row| filter.map_or(true, |f| f.matches(row)))
            .cloned()
            .collect())
    }

    async fn update_fields(
        &self,
        table: &str,
        filter: &Filter,
        fields: Row,
    ) -> StoreResult<Vec<Row>> {
        let Some(mut rows) = self.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            row.extend(fields.clone());
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Row>> {
        let Some(mut rows) = self.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (deleted, kept): (Vec<Row>, Vec<Row>) =
            rows.drain(..).partition(|row| filter.matches(row));
        *rows = kept;
        Ok(deleted)
    }
}
