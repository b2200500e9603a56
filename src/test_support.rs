// Shared helpers for handler tests

use crate::core::config::Config;
use crate::core::state::AppState;
use crate::models::contact::{CONTACTS_TABLE, CONTACT_KEY};
use crate::stores::memory_store::MemoryTableStore;
use crate::stores::table_store::{Filter, Row, StoreError, StoreResult, TableStore};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How a [`ScriptedStore`] answers every call
pub enum Behavior {
    /// Fail with a remote error carrying this message
    Fail(&'static str),
    Panic,
}

/// Store that counts calls and answers them all the same way
pub struct ScriptedStore {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> StoreResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Fail(message) => Err(StoreError::Remote {
                status: 503,
                message: message.to_string(),
            }),
            Behavior::Panic => panic!("table store exploded"),
        }
    }
}

#[async_trait]
impl TableStore for ScriptedStore {
    async fn insert(&self, _table: &str, _row: Row) -> StoreResult<Vec<Row>> {
        self.answer()
    }

    async fn upsert(&self, _table: &str, _row: Row, _on_conflict: &str) -> StoreResult<Vec<Row>> {
        self.answer()
    }

    async fn select(&self, _table: &str, _filter: Option<&Filter>) -> StoreResult<Vec<Row>> {
        self.answer()
    }

    async fn update_fields(&self, _table: &str, _filter: &Filter, _fields: Row) -> StoreResult<Vec<Row>> {
        self.answer()
    }

    async fn delete(&self, _table: &str, _filter: &Filter) -> StoreResult<Vec<Row>> {
        self.answer()
    }
}

pub fn memory_state() -> (Arc<AppState>, Arc<MemoryTableStore>) {
    let store = Arc::new(MemoryTableStore::new().with_unique_column(CONTACTS_TABLE, CONTACT_KEY));
    let state = AppState::new(Config::default(), store.clone());
    (Arc::new(state), store)
}

pub fn scripted_state(behavior: Behavior) -> (Arc<AppState>, Arc<ScriptedStore>) {
    let store = Arc::new(ScriptedStore::new(behavior));
    let state = AppState::new(Config::default(), store.clone());
    (Arc::new(state), store)
}

pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let (parts, body) = response.into_parts();
    let bytes = Body::new(body).collect().await.unwrap().to_bytes();
    (parts.status, serde_json::from_slice(&bytes).unwrap())
}
