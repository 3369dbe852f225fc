//! Application state.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::storage::{LocalReceiptStore, ReceiptStore};

/// Application state shared across handlers.
pub struct AppState {
    /// Database connection pool.
    pub db: DatabaseConnection,

    /// Service configuration.
    pub config: AppConfig,

    /// Where uploaded receipt images go.
    pub receipts: Arc<dyn ReceiptStore>,
}

impl AppState {
    /// Create state with a local receipt store from `config.receipts`.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let store = LocalReceiptStore::new(
            &config.receipts.storage_dir,
            &config.receipts.public_base_url,
        );
        tracing::info!(dir = %store.root().display(), "Receipt storage ready");

        Self {
            db,
            config,
            receipts: Arc::new(store),
        }
    }
}
