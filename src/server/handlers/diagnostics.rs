use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::server::AppState;
use crate::store::{DocumentStore, StoreHandle};

const MAX_COLLECTIONS: usize = 10;
const MAX_ERROR_CHARS: usize = 50;

/// Outcome of one diagnostic step.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    Ok(T),
    Unavailable,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

fn truncate(msg: &str) -> String {
    msg.chars().take(MAX_ERROR_CHARS).collect()
}

fn set_flag(present: bool) -> String {
    if present { "✅ Set" } else { "❌ Not Set" }.to_string()
}

fn locate_store(handle: &StoreHandle) -> Probe<Arc<dyn DocumentStore>> {
    match handle {
        StoreHandle::Missing => Probe::Unavailable,
        StoreHandle::Uninitialized(reason) => Probe::Failed(reason.clone()),
        StoreHandle::Ready(store) => Probe::Ok(Arc::clone(store)),
    }
}

async fn list_collections(store: &dyn DocumentStore) -> Result<Vec<String>, String> {
    store
        .list_collection_names(MAX_COLLECTIONS)
        .await
        .map(|names| names.into_iter().take(MAX_COLLECTIONS).collect())
        .map_err(|e| e.to_string())
}

pub async fn build_report(handle: &StoreHandle, config: &DatabaseConfig) -> DiagnosticsReport {
    let mut report = DiagnosticsReport {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        database_url: set_flag(config.url().is_some()),
        database_name: set_flag(config.name().is_some()),
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    match locate_store(handle) {
        Probe::Unavailable => {
            report.database =
                "❌ Database module not found (set DATABASE_URL first)".to_string();
        }
        Probe::Failed(reason) => {
            tracing::warn!("diagnostics: store not initialized: {}", reason);
            report.database = "⚠️  Available but not initialized".to_string();
        }
        Probe::Ok(store) => {
            report.connection_status = "Connected".to_string();
            report.database = "✅ Available".to_string();
            match list_collections(store.as_ref()).await {
                Ok(names) => {
                    report.collections = names;
                    report.database = "✅ Connected & Working".to_string();
                }
                Err(msg) => {
                    report.database = format!("⚠️  Connected but Error: {}", truncate(&msg));
                }
            }
        }
    }

    report
}

pub async fn test_database(State(app_state): State<Arc<AppState>>) -> Json<DiagnosticsReport> {
    Json(build_report(&app_state.store, &app_state.config.database).await)
}
