use axum::extract::State;
use axum::Json;

use crate::api::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the router is serving; also reports what is wired up.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let watched = state.registry.watched().await.len();
    Json(serde_json::json!({
        "status": "ready",
        "watchedUsers": watched,
        "receiptScanners": state.scanner.len(),
    }))
}
