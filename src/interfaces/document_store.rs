//! Document storage interface.

use async_trait::async_trait;
use uuid::Uuid;

use scorestream_client::{Document, InvalidHistory};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(Uuid),

    #[error("Stored history for {id} is invalid: {source}")]
    InvalidHistory {
        id: Uuid,
        #[source]
        source: InvalidHistory,
    },

    #[error("Unknown document kind: {0}")]
    InvalidKind(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Interface for document persistence.
///
/// Implementations:
/// - `MockDocumentStore`: in-memory storage
/// - `SqliteDocumentStore`: SQLite storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document with its full version history.
    async fn load(&self, id: Uuid) -> Result<Document>;

    /// Insert or replace a document and its version history.
    async fn save(&self, document: &Document) -> Result<()>;

    /// List stored document ids.
    async fn list(&self) -> Result<Vec<Uuid>>;
}
