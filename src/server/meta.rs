use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;

use crate::server::AppState;
use crate::server::response::ApiResponse;
use crate::types::constants::all_constants;

pub fn meta_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/constants", get(constants))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.store.ping() {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("database ping failed: {e}");
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "service": "sintropia-api",
        "database": database,
    }))
}

async fn constants() -> impl IntoResponse {
    Json(ApiResponse::success(all_constants()))
}
