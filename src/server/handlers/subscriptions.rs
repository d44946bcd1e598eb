use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::server::AppState;
use crate::store::{Document, DocumentFilter, get_documents};
use crate::subscription::SUBSCRIPTION_COLLECTION;

pub const SUBSCRIPTIONS_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionsQuery {
    pub email: Option<String>,
    pub user_id: Option<String>,
}

impl SubscriptionsQuery {
    pub fn to_filter(&self) -> DocumentFilter {
        DocumentFilter::new()
            .eq_opt("user_id", self.user_id.as_deref())
            .eq_opt("email", self.email.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionList {
    pub items: Vec<Document>,
}

pub async fn get_subscriptions(
    State(app_state): State<Arc<AppState>>,
    params: std::result::Result<Query<SubscriptionsQuery>, QueryRejection>,
) -> Result<Json<SubscriptionList>, AppError> {
    let Query(params) = params?;
    let store = app_state.store.ready()?;
    let filter = params.to_filter();
    let items = get_documents(
        store.as_ref(),
        SUBSCRIPTION_COLLECTION,
        &filter,
        SUBSCRIPTIONS_LIMIT,
    )
    .await?;
    tracing::debug!(
        conditions = filter.conditions().len(),
        count = items.len(),
        "subscriptions fetched"
    );
    Ok(Json(SubscriptionList { items }))
}
