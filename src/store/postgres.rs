use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

use super::{Document, DocumentFilter, DocumentStore, ID_FIELD, new_document_id};
use crate::error::{AppError, Result};

// Ping each client at a jittered interval so idle connections are not
// dropped by proxies all at the same moment.
fn spawn_keepalive(client: Arc<Client>, min_secs: u64, max_secs: u64) {
    let max_secs = max_secs.max(min_secs + 1);
    tokio::spawn(async move {
        loop {
            let wait = rand::Rng::random_range(&mut rand::rng(), min_secs..=max_secs);
            tokio::time::sleep(std::time::Duration::from_secs(wait)).await;
            if client.is_closed() {
                tracing::warn!("postgres client closed; stopping keepalive");
                break;
            }
            let ping = tokio::time::timeout(
                std::time::Duration::from_secs(5),
                client.execute("SELECT 1", &[]),
            )
            .await;
            if !matches!(ping, Ok(Ok(_))) {
                tracing::warn!("postgres keepalive ping failed");
            }
        }
    });
}

pub struct PgPool {
    clients: Vec<Arc<Client>>,
    next: AtomicUsize,
}

impl PgPool {
    async fn connect_many(pg_url: &str, schema: &Option<String>, size: usize) -> Result<Self> {
        let mut clients = Vec::with_capacity(size.max(1));
        for _ in 0..size.max(1) {
            let (client, connection) = tokio_postgres::connect(pg_url, NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!("postgres connection error: {}", e);
                }
            });
            if let Some(s) = schema {
                if !is_identifier(s) {
                    return Err(AppError::Config(format!("invalid schema name: {}", s)));
                }
                client
                    .batch_execute(&format!(
                        "CREATE SCHEMA IF NOT EXISTS {s}; SET search_path TO {s}"
                    ))
                    .await?;
            }
            let client = Arc::new(client);
            spawn_keepalive(Arc::clone(&client), 240, 420);
            clients.push(client);
        }
        Ok(Self {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    pub fn pick(&self) -> Arc<Client> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len().max(1);
        Arc::clone(&self.clients[idx])
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !s.starts_with(|c: char| c.is_ascii_digit())
}

/// Builds the filtered select; every value is bound as a text parameter.
fn select_documents_sql(
    collection: &str,
    filter: &DocumentFilter,
    limit: usize,
) -> (String, Vec<String>) {
    let mut texts: Vec<String> = vec![collection.to_string()];
    let mut sql = String::from("SELECT id, content FROM documents WHERE collection = $1");
    for (field, value) in filter.conditions() {
        texts.push(field.clone());
        texts.push(value.clone());
        let (key, val) = (texts.len() - 1, texts.len());
        sql.push_str(&format!(
            " AND jsonb_typeof(content::jsonb -> ${key}) = 'string' AND (content::jsonb ->> ${key}) = ${val}"
        ));
    }
    sql.push_str(&format!(" ORDER BY seq LIMIT {}", limit.min(i64::MAX as usize)));
    (sql, texts)
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: Arc<PgPool>,
    name: String,
}

impl PgDocumentStore {
    pub async fn connect(pg_url: &str, schema: &Option<String>, pool_size: usize) -> Result<Self> {
        let pool = PgPool::connect_many(pg_url, schema, pool_size).await?;
        let client = pool.pick();
        client
            .batch_execute(
                r#"CREATE TABLE IF NOT EXISTS documents (
                seq BIGSERIAL PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                collection TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents (collection);"#,
            )
            .await?;

        let row = client.query_one("SELECT current_database()", &[]).await?;
        let database: String = row.get(0);
        let name = match schema {
            Some(s) => format!("{}.{}", database, s),
            None => database,
        };
        tracing::info!("Using PostgreSQL document store: {}", name);

        Ok(Self {
            pool: Arc::new(pool),
            name,
        })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn insert_document(&self, collection: &str, doc: Document) -> Result<String> {
        let id = new_document_id();
        let content = serde_json::to_string(&doc)?;
        let now = Utc::now();
        let client = self.pool.pick();
        client
            .execute(
                "INSERT INTO documents (id, collection, content, created_at) VALUES ($1, $2, $3, $4)",
                &[&id, &collection, &content, &now],
            )
            .await?;
        Ok(id)
    }

    async fn get_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        limit: usize,
    ) -> Result<Vec<Document>> {
        let (sql, texts) = select_documents_sql(collection, filter, limit);
        let params: Vec<&(dyn ToSql + Sync)> =
            texts.iter().map(|t| t as &(dyn ToSql + Sync)).collect();
        let client = self.pool.pick();
        let rows = client.query(sql.as_str(), &params).await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get(0);
            let content: String = row.get(1);
            let mut doc: Document = serde_json::from_str(&content)?;
            doc.insert(ID_FIELD.into(), Value::String(id));
            docs.push(doc);
        }
        Ok(docs)
    }

    async fn list_collection_names(&self, limit: usize) -> Result<Vec<String>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let client = self.pool.pick();
        let rows = client
            .query(
                "SELECT DISTINCT collection FROM documents ORDER BY collection LIMIT $1",
                &[&limit],
            )
            .await?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }
}
