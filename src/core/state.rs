// Application state (AppState)

use crate::api::client::RestTableStore;
use crate::core::config::Config;
use crate::models::contact::{CONTACTS_TABLE, CONTACT_KEY};
use crate::stores::memory_store::MemoryTableStore;
use crate::stores::table_store::TableStore;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Shared application state
///
/// Handlers keep nothing between requests; the store port is the only
/// shared component.
#[derive(Clone)]
pub struct AppState {
    /// Table store every operation is forwarded to
    pub store: Arc<dyn TableStore>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Build the state with the store backend named in the config
    pub fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn TableStore> = match config.store.backend.as_str() {
            "memory" => Arc::new(
                MemoryTableStore::new().with_unique_column(CONTACTS_TABLE, CONTACT_KEY),
            ),
            _ => Arc::new(
                RestTableStore::new(
                    config.store.url.clone(),
                    config.store.api_key.clone(),
                    config.request_timeout(),
                )
                .context("Failed to create table store client")?,
            ),
        };

        Ok(Self::new(config, store))
    }
}
