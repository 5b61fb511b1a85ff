//! `GET /api/now-playing` route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::api::server::AppState;

/// Handler for `GET /api/now-playing`.
///
/// Proxies the playback state of the configured Spotify account: 200 with
/// the player JSON when something is playing, 204 when idle, 503 when
/// Spotify credentials were never configured.
pub async fn get_now_playing(State(state): State<Arc<AppState>>) -> Response {
    let Some(ref source) = state.now_playing else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Spotify is not configured" })),
        )
            .into_response();
    };

    match source.currently_playing().await {
        Ok(Some(payload)) => (StatusCode::OK, Json(payload)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!(error = %e, "Now-playing fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
