//! Document create/update flows.
//!
//! Each flow brackets one orchestrator run with `clear` and `finish`, so a
//! consumer sees exactly one request per call, and persists the result.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use scorestream_client::{Document, DocumentKind, StreamPart};

use super::{GenerationRequest, Orchestrator};
use crate::interfaces::{DocumentStore, StorageError, StreamWriter, TransportError};

/// Message returned after a successful create.
pub const CREATED_MESSAGE: &str = "A document was created and is now visible to the user.";
/// Message returned after a successful update.
pub const UPDATED_MESSAGE: &str = "The document has been updated successfully.";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Document not found")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Storage(other),
        }
    }
}

/// Result of a create or update, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub kind: DocumentKind,
    pub versions: usize,
    pub content: String,
}

impl DocumentSummary {
    fn of(document: &Document, message: &str) -> Self {
        Self {
            id: document.id,
            title: document.title.clone(),
            kind: document.kind,
            versions: document.history.len(),
            content: message.to_string(),
        }
    }
}

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    orchestrator: Orchestrator,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, orchestrator: Orchestrator) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Generate and save a new document under a fresh id.
    pub async fn create_document(
        &self,
        title: &str,
        kind: DocumentKind,
        writer: &dyn StreamWriter,
    ) -> Result<DocumentSummary, ServiceError> {
        self.create_document_with_id(Uuid::new_v4(), title, kind, writer)
            .await
    }

    /// Generate and save a new document under a caller-chosen id, so a local
    /// consumer can track the same document while it streams.
    #[tracing::instrument(name = "document.create", skip(self, writer), fields(document_id = %id))]
    pub async fn create_document_with_id(
        &self,
        id: Uuid,
        title: &str,
        kind: DocumentKind,
        writer: &dyn StreamWriter,
    ) -> Result<DocumentSummary, ServiceError> {
        let mut document = Document::new(id, title, kind);

        writer.write(StreamPart::Clear(title.to_string())).await?;
        let request = GenerationRequest::Create {
            title: title.to_string(),
        };
        let content = self.orchestrator.run(&request, writer).await?;
        writer.write(StreamPart::Finish).await?;

        document.history.commit(content, Utc::now());
        self.store.save(&document).await?;

        info!(document_id = %document.id, "Document created");
        Ok(DocumentSummary::of(&document, CREATED_MESSAGE))
    }

    /// Revise an existing document. Nothing is written if it does not exist.
    #[tracing::instrument(name = "document.update", skip(self, writer), fields(document_id = %id))]
    pub async fn update_document(
        &self,
        id: Uuid,
        description: &str,
        writer: &dyn StreamWriter,
    ) -> Result<DocumentSummary, ServiceError> {
        let mut document = match self.store.load(id).await {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "Cannot update document");
                return Err(e.into());
            }
        };

        writer.write(StreamPart::Clear(document.title.clone())).await?;
        let request = GenerationRequest::Update {
            description: description.to_string(),
            existing_content: document.latest_content().to_string(),
        };
        let content = self.orchestrator.run(&request, writer).await?;
        writer.write(StreamPart::Finish).await?;

        if document.history.commit(content, Utc::now()) {
            self.store.save(&document).await?;
            info!(versions = document.history.len(), "Document updated");
        } else {
            info!("Update left content unchanged");
        }
        Ok(DocumentSummary::of(&document, UPDATED_MESSAGE))
    }

    /// Load a stored document.
    pub async fn get_document(&self, id: Uuid) -> Result<Document, ServiceError> {
        Ok(self.store.load(id).await?)
    }
}
