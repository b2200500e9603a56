use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// A single row as exchanged with the table store
pub type Row = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Failed to reach table store: {0}")]
    Transport(String),

    #[error("Failed to decode table store response: {0}")]
    Decode(String),
}

/// Equality match on a single column (`column = value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether a row satisfies this filter.
    ///
    /// Strings compare verbatim, other scalars compare by their JSON text,
    /// so a numeric `phone_no` column still matches `"9876543210"`.
    pub fn matches(&self, row: &Row) -> bool {
        match row.get(&self.column) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=eq.{}", self.column, self.value)
    }
}

/// Port onto the remote table store.
///
/// Every mutating call returns the rows it touched, so an empty vector means
/// nothing matched.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Inserts a new row.
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Vec<Row>>;

    /// Inserts a row or replaces the supplied fields of the row sharing the
    /// same `on_conflict` column value.
    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> StoreResult<Vec<Row>>;

    /// Selects all rows, or only those matching `filter`.
    async fn select(&self, table: &str, filter: Option<&Filter>) -> StoreResult<Vec<Row>>;

    /// Overwrites `fields` on every row matching `filter`.
    async fn update_fields(&self, table: &str, filter: &Filter, fields: Row)
        -> StoreResult<Vec<Row>>;

    /// Deletes every row matching `filter`.
    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Row>>;
}
