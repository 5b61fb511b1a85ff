//! Health endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::server::AppState;

/// GET /api/health. Reports liveness and whether the Spotify proxy is wired.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "spotify": state.now_playing.is_some(),
    }))
}
