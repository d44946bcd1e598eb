pub mod handlers;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::Result as AppResult;
use crate::store::StoreHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub catalog: Arc<Catalog>,
    pub store: StoreHandle,
}

impl AppState {
    pub fn new(config: Settings, store: StoreHandle) -> Self {
        Self {
            config,
            catalog: Arc::new(Catalog::default()),
            store,
        }
    }
}

pub async fn create_app(config: Settings) -> AppResult<Router> {
    // A store that fails to open is reported by /test rather than aborting boot
    let store = StoreHandle::open(&config.database).await;
    let app_state = AppState::new(config, store);
    tracing::info!(
        "Serving {} plans from the catalog",
        app_state.catalog.plans().len()
    );
    Ok(router(Arc::new(app_state)))
}

pub fn router(app_state: Arc<AppState>) -> Router {
    // 任意来源（反射请求来源以便携带凭据）
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    handlers::routes().with_state(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}
