use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Document, DocumentFilter, DocumentStore, ID_FIELD, new_document_id};
use crate::error::Result;

/// Process-local store, selected with `DATABASE_URL=memory://`.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<BTreeMap<String, Vec<(String, Document)>>>>,
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> String {
        "memory".to_string()
    }

    async fn insert_document(&self, collection: &str, doc: Document) -> Result<String> {
        let id = new_document_id();
        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), doc));
        Ok(id)
    }

    async fn get_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let guard = self.collections.read().await;
        let Some(docs) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .take(limit)
            .map(|(id, doc)| {
                let mut out = doc.clone();
                out.insert(ID_FIELD.into(), Value::String(id.clone()));
                out
            })
            .collect())
    }

    async fn list_collection_names(&self, limit: usize) -> Result<Vec<String>> {
        let guard = self.collections.read().await;
        Ok(guard.keys().take(limit).cloned().collect())
    }
}
