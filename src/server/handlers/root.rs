use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RootMessage {
    pub message: String,
}

pub async fn read_root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "Hello from the pricing backend!".to_string(),
    })
}
