pub mod filter;
pub mod memory;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseTarget};
use crate::error::{AppError, Result};

pub use filter::DocumentFilter;
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// A stored record: a JSON object. Reads carry the identifier as `_id`.
pub type Document = serde_json::Map<String, Value>;

pub const ID_FIELD: &str = "_id";

// 文档存储抽象（可由 SQLite、Postgres、内存等实现）
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the underlying database, for diagnostics.
    fn name(&self) -> String;

    /// Persists one document and returns its generated identifier.
    async fn insert_document(&self, collection: &str, doc: Document) -> Result<String>;

    /// Returns at most `limit` documents of `collection` matching `filter`,
    /// in insertion order.
    async fn get_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        limit: usize,
    ) -> Result<Vec<Document>>;

    async fn list_collection_names(&self, limit: usize) -> Result<Vec<String>>;
}

pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Serializes `record` and stamps `created_at`/`updated_at`.
pub fn prepare_document<T: Serialize>(record: &T) -> Result<Document> {
    let Value::Object(mut doc) = serde_json::to_value(record)? else {
        return Err(AppError::BadRequest(
            "document must serialize to a JSON object".into(),
        ));
    };
    let now = Value::String(crate::time::to_iso8601_utc_string(&Utc::now()));
    doc.insert("created_at".into(), now.clone());
    doc.insert("updated_at".into(), now);
    doc.remove(ID_FIELD);
    Ok(doc)
}

pub async fn create_document<T: Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    record: &T,
) -> Result<String> {
    let doc = prepare_document(record)?;
    let id = store.insert_document(collection, doc).await?;
    tracing::debug!(collection, id = %id, "document created");
    Ok(id)
}

pub async fn get_documents(
    store: &dyn DocumentStore,
    collection: &str,
    filter: &DocumentFilter,
    limit: usize,
) -> Result<Vec<Document>> {
    filter.validate()?;
    store.get_documents(collection, filter, limit).await
}

/// The document store as the rest of the app sees it.
#[derive(Clone)]
pub enum StoreHandle {
    /// No `DATABASE_URL` configured.
    Missing,
    /// Configured, but opening it failed at boot.
    Uninitialized(String),
    Ready(Arc<dyn DocumentStore>),
}

impl StoreHandle {
    pub async fn open(config: &DatabaseConfig) -> Self {
        let Some(target) = config.target() else {
            tracing::warn!("DATABASE_URL not set; running without a document store");
            return StoreHandle::Missing;
        };

        let opened: Result<Arc<dyn DocumentStore>> = match &target {
            DatabaseTarget::Postgres { url, schema } => {
                PgDocumentStore::connect(url, schema, config.pool_size)
                    .await
                    .map(|s| Arc::new(s) as Arc<dyn DocumentStore>)
            }
            DatabaseTarget::Sqlite { path } => SqliteDocumentStore::new(path)
                .await
                .map(|s| Arc::new(s) as Arc<dyn DocumentStore>),
            DatabaseTarget::Memory => {
                Ok(Arc::new(MemoryDocumentStore::default()) as Arc<dyn DocumentStore>)
            }
        };

        match opened {
            Ok(store) => {
                tracing::info!("Document store ready: {}", store.name());
                StoreHandle::Ready(store)
            }
            Err(e) => {
                tracing::error!("Failed to open document store: {}", e);
                StoreHandle::Uninitialized(e.to_string())
            }
        }
    }

    pub fn ready(&self) -> Result<&Arc<dyn DocumentStore>> {
        match self {
            StoreHandle::Ready(store) => Ok(store),
            _ => Err(AppError::Unavailable("Database not available".into())),
        }
    }
}
