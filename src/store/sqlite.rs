use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Document, DocumentFilter, DocumentStore, ID_FIELD, new_document_id};
use crate::error::Result;

#[derive(Clone)]
pub struct SqliteDocumentStore {
    connection: Arc<Mutex<Connection>>,
    name: String,
}

impl SqliteDocumentStore {
    pub async fn new(database_path: &str) -> Result<Self> {
        // 确保数据库文件的目录存在
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                tracing::info!("Created database directory: {}", parent.display());
            }
        }

        let conn = Connection::open(database_path)?;
        tracing::info!("Database initialized at: {}", database_path);

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                collection TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection)",
            [],
        )?;

        let name = Path::new(database_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| database_path.to_string());

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
            name,
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn insert_document(&self, collection: &str, doc: Document) -> Result<String> {
        let id = new_document_id();
        let content = serde_json::to_string(&doc)?;
        let created_at = doc
            .get("created_at")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| crate::time::to_iso8601_utc_string(&chrono::Utc::now()));

        let conn = self.connection.lock().await;
        conn.execute(
            "INSERT INTO documents (id, collection, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            (&id, collection, &content, &created_at),
        )?;
        Ok(id)
    }

    async fn get_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let mut sql = String::from("SELECT id, content FROM documents WHERE collection = ?");
        let mut params = vec![SqlValue::Text(collection.to_string())];
        for (field, value) in filter.conditions() {
            // json_type keeps numbers and booleans out of text comparisons
            sql.push_str(" AND json_type(content, ?) = 'text' AND json_extract(content, ?) = ?");
            let path = format!("$.{}", field);
            params.push(SqlValue::Text(path.clone()));
            params.push(SqlValue::Text(path));
            params.push(SqlValue::Text(value.clone()));
        }
        sql.push_str(" ORDER BY seq LIMIT ?");
        params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        let rows: Vec<(String, String)> = {
            let conn = self.connection.lock().await;
            let mut stmt = conn.prepare(&sql)?;
            let iter = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            iter.collect::<rusqlite::Result<_>>()?
        };

        let mut docs = Vec::with_capacity(rows.len());
        for (id, content) in rows {
            let mut doc: Document = serde_json::from_str(&content)?;
            doc.insert(ID_FIELD.into(), Value::String(id));
            docs.push(doc);
        }
        Ok(docs)
    }

    async fn list_collection_names(&self, limit: usize) -> Result<Vec<String>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT collection FROM documents ORDER BY collection LIMIT ?1",
        )?;
        let names = stmt
            .query_map([i64::try_from(limit).unwrap_or(i64::MAX)], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn creates_parent_directory_and_names_after_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("pricing.db");
        let store = SqliteDocumentStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        assert!(path.exists());
        assert_eq!(store.name(), "pricing");
    }

    #[tokio::test]
    async fn insert_then_filter_by_json_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteDocumentStore::new(path.to_str().unwrap())
            .await
            .unwrap();

        let a = store
            .insert_document(
                "subscription",
                doc(json!({"email": "a@b.com", "user_id": "u1", "price": 29.0, "active": true})),
            )
            .await
            .unwrap();
        let b = store
            .insert_document(
                "subscription",
                doc(json!({"email": "c@d.com", "user_id": null, "price": 9.0, "active": false})),
            )
            .await
            .unwrap();
        store
            .insert_document("other", doc(json!({"email": "a@b.com"})))
            .await
            .unwrap();
        assert_ne!(a, b);

        let all = store
            .get_documents("subscription", &DocumentFilter::new(), 50)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0][ID_FIELD], Value::String(a.clone()));
        assert_eq!(all[1][ID_FIELD], Value::String(b));

        let by_email = store
            .get_documents(
                "subscription",
                &DocumentFilter::new().eq("email", "a@b.com"),
                50,
            )
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0]["user_id"], "u1");

        let both = store
            .get_documents(
                "subscription",
                &DocumentFilter::new().eq("email", "a@b.com").eq("user_id", "u2"),
                50,
            )
            .await
            .unwrap();
        assert!(both.is_empty());

        let by_bool_text = store
            .get_documents(
                "subscription",
                &DocumentFilter::new().eq("active", "true"),
                50,
            )
            .await
            .unwrap();
        assert!(by_bool_text.is_empty());
    }

    #[tokio::test]
    async fn filter_semantics_agree_with_memory_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("agree.db");
        let sqlite = SqliteDocumentStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        let memory = crate::store::MemoryDocumentStore::default();

        let docs = [
            json!({"tag": "a", "v": "29"}),
            json!({"tag": "b", "v": 29}),
            json!({"tag": "c", "v": 29.0}),
            json!({"tag": "d", "v": true}),
            json!({"tag": "e", "v": "true"}),
            json!({"tag": "f", "v": null}),
            json!({"tag": "g"}),
        ];
        for d in &docs {
            sqlite.insert_document("mixed", doc(d.clone())).await.unwrap();
            memory.insert_document("mixed", doc(d.clone())).await.unwrap();
        }

        for (value, expected) in [("29", vec!["a"]), ("true", vec!["e"]), ("null", vec![])] {
            let filter = DocumentFilter::new().eq("v", value);
            for store in [&sqlite as &dyn DocumentStore, &memory as &dyn DocumentStore] {
                let found = store.get_documents("mixed", &filter, 50).await.unwrap();
                let tags: Vec<&str> = found.iter().map(|d| d["tag"].as_str().unwrap()).collect();
                assert_eq!(tags, expected, "{} with v = {:?}", store.name(), value);
            }
        }
    }

    #[tokio::test]
    async fn limit_caps_results() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cap.db");
        let store = SqliteDocumentStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        for i in 0..7 {
            store
                .insert_document("subscription", doc(json!({"n": i})))
                .await
                .unwrap();
        }
        let docs = store
            .get_documents("subscription", &DocumentFilter::new(), 5)
            .await
            .unwrap();
        assert_eq!(docs.len(), 5);
        assert_eq!(docs[4]["n"], 4);
    }

    #[tokio::test]
    async fn lists_distinct_collections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.db");
        let store = SqliteDocumentStore::new(path.to_str().unwrap())
            .await
            .unwrap();
        assert!(store.list_collection_names(10).await.unwrap().is_empty());
        for c in ["subscription", "subscription", "audit"] {
            store.insert_document(c, Document::new()).await.unwrap();
        }
        assert_eq!(
            store.list_collection_names(10).await.unwrap(),
            vec!["audit".to_string(), "subscription".to_string()]
        );
    }

    #[tokio::test]
    async fn reopening_keeps_documents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist.db");
        let path = path.to_str().unwrap();
        {
            let store = SqliteDocumentStore::new(path).await.unwrap();
            store
                .insert_document("subscription", doc(json!({"email": "a@b.com"})))
                .await
                .unwrap();
        }
        let store = SqliteDocumentStore::new(path).await.unwrap();
        let docs = store
            .get_documents("subscription", &DocumentFilter::new(), 50)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }
}
