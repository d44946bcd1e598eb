use axum::extract::rejection::JsonRejection;
use axum::{Json, extract::State};
use std::sync::Arc;

use crate::error::AppError;
use crate::server::AppState;
use crate::store::create_document;
use crate::subscription::{
    CheckoutRequest, CheckoutResponse, SUBSCRIPTION_COLLECTION, Subscription,
};

pub async fn checkout(
    State(app_state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let Json(payload) = payload?;
    let Some(plan) = app_state.catalog.find(&payload.plan_id) else {
        tracing::info!(plan_id = %payload.plan_id, "checkout for unknown plan");
        return Err(AppError::NotFound("Plan not found".into()));
    };

    // Payment is simulated: the subscription is recorded as active right away
    let subscription = Subscription::activate(plan, payload.email, payload.user_id);
    let store = app_state.store.ready()?;
    let subscription_id =
        create_document(store.as_ref(), SUBSCRIPTION_COLLECTION, &subscription).await?;

    tracing::info!(
        plan_id = %plan.id,
        subscription_id = %subscription_id,
        "subscription activated"
    );

    Ok(Json(CheckoutResponse {
        subscription_id,
        status: subscription.status,
        message: format!("Subscription for {} activated", plan.name),
    }))
}
