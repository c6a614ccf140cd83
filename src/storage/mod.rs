//! Storage implementations.

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigError, StorageConfig};
use crate::interfaces::DocumentStore;

pub mod mock;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use crate::interfaces::document_store::{Result, StorageError};
pub use mock::MockDocumentStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Initialize storage based on configuration.
pub async fn init_storage(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn DocumentStore>, Box<dyn std::error::Error>> {
    info!("Storage: {} at {}", config.storage_type, config.path);

    match config.storage_type.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            if let Some(parent) = std::path::Path::new(&config.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.path)).await?;

            let store = SqliteDocumentStore::new(pool);
            store.init().await?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MockDocumentStore::new())),
        other => Err(Box::new(ConfigError::UnknownType {
            kind: "storage",
            value: other.to_string(),
        })),
    }
}
