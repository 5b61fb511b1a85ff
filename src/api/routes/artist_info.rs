//! `POST /api/artist-info` route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::server::AppState;
use crate::error::SpinError;

/// Request body for `POST /api/artist-info`.
#[derive(Debug, Deserialize)]
pub struct ArtistInfoRequest {
    #[serde(rename = "artistName", default)]
    pub artist_name: Option<String>,
}

/// Handler for `POST /api/artist-info`.
///
/// Responds `{ "text": <summary>, "cached": <bool> }` on success; the `text`
/// key is omitted when the summarizer produced nothing. A missing or blank
/// `artistName` is a 400, a summarizer failure a 502.
pub async fn post_artist_info(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ArtistInfoRequest>,
) -> (StatusCode, Json<Value>) {
    let artist_name = req.artist_name.unwrap_or_default();

    match state.resolver.resolve(&artist_name).await {
        Ok(resolution) => {
            let mut body = json!({ "cached": resolution.cached });
            if let Some(text) = resolution.text {
                body["text"] = Value::String(text);
            }
            (StatusCode::OK, Json(body))
        }
        Err(SpinError::InvalidInput(_)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing artistName" })),
        ),
        Err(e @ SpinError::Summarization(_)) => {
            warn!(error = %e, "Artist info request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
        }
        Err(e) => {
            warn!(error = %e, "Artist info request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SqliteArtistStore;
    use crate::error::Result;
    use crate::resolver::ArtistInfoResolver;
    use crate::summarizer::Summarizer;
    use async_trait::async_trait;

    struct FixedSummarizer(&'static str);

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, _artist_name: &str) -> Result<Option<String>> {
            Ok(Some(self.0.to_string()))
        }
    }

    struct EmptySummarizer;

    #[async_trait]
    impl Summarizer for EmptySummarizer {
        async fn summarize(&self, _artist_name: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _artist_name: &str) -> Result<Option<String>> {
            Err(SpinError::Summarization("model unavailable".into()))
        }
    }

    fn test_state(summarizer: Arc<dyn Summarizer>) -> State<Arc<AppState>> {
        let store = Arc::new(SqliteArtistStore::open_in_memory().unwrap());
        let resolver = ArtistInfoResolver::new(store, summarizer);
        State(Arc::new(AppState::new(resolver)))
    }

    fn request(artist_name: Option<&str>) -> Json<ArtistInfoRequest> {
        Json(ArtistInfoRequest {
            artist_name: artist_name.map(String::from),
        })
    }

    #[tokio::test]
    async fn test_missing_artist_name_is_400() {
        let state = test_state(Arc::new(FixedSummarizer("x")));
        let (status, Json(body)) = post_artist_info(state, request(None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing artistName");
    }

    #[tokio::test]
    async fn test_blank_artist_name_is_400() {
        let state = test_state(Arc::new(FixedSummarizer("x")));
        let (status, Json(body)) = post_artist_info(state, request(Some("   "))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing artistName");
    }

    #[tokio::test]
    async fn test_fresh_lookup_returns_text_uncached() {
        let state = test_state(Arc::new(FixedSummarizer("A singular voice.")));
        let (status, Json(body)) = post_artist_info(state, request(Some("Nina Simone"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "A singular voice.");
        assert_eq!(body["cached"], false);
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let state = test_state(Arc::new(FixedSummarizer("A singular voice.")));
        let (_, Json(first)) = post_artist_info(state.clone(), request(Some("Nina Simone"))).await;
        assert_eq!(first["cached"], false);

        let (status, Json(second)) = post_artist_info(state, request(Some("nina simone"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["text"], "A singular voice.");
        assert_eq!(second["cached"], true);
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_502() {
        let state = test_state(Arc::new(FailingSummarizer));
        let (status, Json(body)) = post_artist_info(state, request(Some("Nina Simone"))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_empty_summary_omits_text_key() {
        let state = test_state(Arc::new(EmptySummarizer));
        let (status, Json(body)) = post_artist_info(state, request(Some("Nina Simone"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("text").is_none());
        assert_eq!(body["cached"], false);
    }
}
