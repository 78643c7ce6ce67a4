use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus storage reachability. Always 200.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let storage = state.store.health().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "survey-api",
        "storage": storage
    }))
}
