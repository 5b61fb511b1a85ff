//! Now-playing fetch against the Spotify Web API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SpinError};

use super::token::TokenProvider;

/// Spotify currently-playing endpoint.
const CURRENTLY_PLAYING_URL: &str = "https://api.spotify.com/v1/me/player/currently-playing";

/// Source of the currently-playing track.
#[async_trait]
pub trait NowPlayingSource: Send + Sync {
    /// `Ok(None)` when nothing is playing.
    async fn currently_playing(&self) -> Result<Option<Value>>;
}

/// Spotify Web API client for the currently-playing track.
pub struct NowPlayingClient {
    tokens: Arc<TokenProvider>,
    endpoint: String,
    client: Client,
}

impl NowPlayingClient {
    pub fn new(tokens: Arc<TokenProvider>) -> Self {
        Self {
            tokens,
            endpoint: CURRENTLY_PLAYING_URL.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Override the API endpoint. Intended for tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl NowPlayingSource for NowPlayingClient {
    async fn currently_playing(&self) -> Result<Option<Value>> {
        let token = self.tokens.bearer_token().await?;

        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| SpinError::Upstream(format!("Now-playing request failed: {}", e)))?;

        match response.status() {
            // 204: nothing playing. 202: playback device temporarily
            // unavailable; treated the same so pollers see a quiet gap.
            StatusCode::NO_CONTENT | StatusCode::ACCEPTED => {
                debug!("Nothing currently playing");
                Ok(None)
            }
            status if status.is_success() => {
                let payload: Value = response.json().await.map_err(|e| {
                    SpinError::Upstream(format!("Failed to parse now-playing response: {}", e))
                })?;
                Ok(Some(payload))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SpinError::Upstream(format!(
                    "Spotify returned HTTP {}: {}",
                    status, body
                )))
            }
        }
    }
}
