use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;

mod checkout;
mod diagnostics;
mod plans;
mod root;
mod subscriptions;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root::read_root))
        .route("/api/plans", get(plans::list_plans))
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/subscriptions", get(subscriptions::get_subscriptions))
        .route("/test", get(diagnostics::test_database))
}
