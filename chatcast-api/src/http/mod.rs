//! Router assembly.

pub mod websocket;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use chatcast_core::registry::StreamRegistry;

/// Build the gateway router over a shared stream registry.
pub fn router(registry: Arc<StreamRegistry>) -> Router {
    Router::new()
        .route("/ws", get(websocket::websocket_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

async fn health(State(registry): State<Arc<StreamRegistry>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "active_streams": registry.active_sessions(),
    }))
}
