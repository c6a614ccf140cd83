//! Mock storage implementations for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use scorestream_client::Document;

use super::{Result, StorageError};
use crate::interfaces::DocumentStore;

/// Mock document store that stores documents in memory.
#[derive(Default)]
pub struct MockDocumentStore {
    documents: RwLock<HashMap<Uuid, Document>>,
    fail_on_load: RwLock<bool>,
    fail_on_save: RwLock<bool>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_load(&self, fail: bool) {
        *self.fail_on_load.write().await = fail;
    }

    pub async fn set_fail_on_save(&self, fail: bool) {
        *self.fail_on_save.write().await = fail;
    }

    /// Seed a document without going through `save`.
    pub async fn insert(&self, document: Document) {
        self.documents.write().await.insert(document.id, document);
    }

    pub async fn stored_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn load(&self, id: Uuid) -> Result<Document> {
        if *self.fail_on_load.read().await {
            return Err(StorageError::Unavailable("Mock load failure".to_string()));
        }
        self.documents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    async fn save(&self, document: &Document) -> Result<()> {
        if *self.fail_on_save.read().await {
            return Err(StorageError::Unavailable("Mock save failure".to_string()));
        }
        self.documents
            .write()
            .await
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self.documents.read().await.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}
