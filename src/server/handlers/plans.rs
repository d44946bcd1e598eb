use axum::{Json, extract::State};
use std::sync::Arc;

use crate::catalog::Plan;
use crate::server::AppState;

pub async fn list_plans(State(app_state): State<Arc<AppState>>) -> Json<Vec<Plan>> {
    Json(app_state.catalog.plans().to_vec())
}
