//! Spotify access-token management via the OAuth refresh-token grant.
//!
//! The access token lives in memory and is refreshed when it expires
//! within a 60-second margin. The clock is injected so expiry logic is
//! testable without waiting.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::SpotifyConfig;
use crate::error::{Result, SpinError};

/// Spotify accounts service token endpoint.
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Seconds before expiry to trigger a proactive refresh.
const REFRESH_BUFFER_SECS: u64 = 60;

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now_unix(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

struct CachedToken {
    access_token: String,
    expires_at: u64,
}

/// Hands out valid bearer tokens for the Spotify Web API.
pub struct TokenProvider {
    credentials: SpotifyConfig,
    token_url: String,
    client: Client,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: SpotifyConfig) -> Self {
        Self {
            credentials,
            token_url: TOKEN_URL.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
            clock: Arc::new(SystemClock),
            cached: Mutex::new(None),
        }
    }

    /// Override the token endpoint. Intended for tests.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Substitute the time source. Intended for tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns a bearer token that will not expire within the refresh
    /// margin.
    ///
    /// Reuses the cached token while it stays outside the margin, otherwise
    /// performs one refresh grant. Concurrent callers serialize on the
    /// cache, so at most one refresh runs at a time.
    pub async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if self.clock.now_unix() + REFRESH_BUFFER_SECS < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Spotify access token missing or expiring, refreshing");
        let fresh = self.refresh_access_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        info!("Spotify access token refreshed");
        Ok(access_token)
    }

    /// Perform the refresh grant against the token endpoint.
    async fn refresh_access_token(&self) -> Result<CachedToken> {
        let basic = STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
        ];

        let resp = self
            .client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", basic))
            .form(&params)
            .send()
            .await
            .map_err(|e| SpinError::TokenRefresh(format!("Token request failed: {}", e)))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SpinError::TokenRefresh(format!(
                "Token endpoint returned HTTP {}: {}",
                status, body
            )));
        }

        #[derive(serde::Deserialize)]
        struct RefreshResponse {
            access_token: String,
            expires_in: u64,
        }

        let parsed: RefreshResponse = serde_json::from_str(&body).map_err(|e| {
            SpinError::TokenRefresh(format!("Failed to parse token response: {}", e))
        })?;

        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: self.clock.now_unix() + parsed.expires_in,
        })
    }

    /// Pre-populate the token cache. Intended for tests of dependents that
    /// must not hit the token endpoint.
    #[cfg(test)]
    pub(crate) async fn seed_token(&self, access_token: &str, expires_at: u64) {
        *self.cached.lock().await = Some(CachedToken {
            access_token: access_token.to_string(),
            expires_at,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::testutil::{spawn_stub, ManualClock};

    fn creds() -> SpotifyConfig {
        SpotifyConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh-abc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_call_performs_refresh_grant() {
        let stub = spawn_stub("200 OK", r#"{"access_token":"tok-1","expires_in":3600}"#).await;
        let provider = TokenProvider::new(creds())
            .with_token_url(stub.base_url.clone())
            .with_clock(ManualClock::at(0));

        let token = provider.bearer_token().await.unwrap();
        assert_eq!(token, "tok-1");
        assert_eq!(stub.hit_count(), 1);

        // hyper writes header names lowercase on the wire.
        let requests = stub.requests.lock().await;
        let expected_basic = STANDARD.encode("id:secret");
        assert!(requests[0].contains(&format!("authorization: Basic {}", expected_basic)));
        assert!(requests[0].contains("grant_type=refresh_token"));
        assert!(requests[0].contains("refresh_token=refresh-abc"));
    }

    #[tokio::test]
    async fn test_cached_token_reused_inside_validity_window() {
        let stub = spawn_stub("200 OK", r#"{"access_token":"tok-1","expires_in":3600}"#).await;
        let clock = ManualClock::at(0);
        let provider = TokenProvider::new(creds())
            .with_token_url(stub.base_url.clone())
            .with_clock(clock.clone());

        provider.bearer_token().await.unwrap();
        clock.advance(3000); // well before the 60s margin at t=3540
        let token = provider.bearer_token().await.unwrap();

        assert_eq!(token, "tok-1");
        assert_eq!(stub.hit_count(), 1);
    }

    #[tokio::test]
    async fn test_token_refreshed_inside_expiry_margin() {
        let stub = spawn_stub("200 OK", r#"{"access_token":"tok-2","expires_in":3600}"#).await;
        let clock = ManualClock::at(0);
        let provider = TokenProvider::new(creds())
            .with_token_url(stub.base_url.clone())
            .with_clock(clock.clone());

        provider.bearer_token().await.unwrap();
        clock.advance(3540); // expires at 3600, now inside the 60s margin
        provider.bearer_token().await.unwrap();

        assert_eq!(stub.hit_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_token_refresh_error() {
        let stub = spawn_stub("400 Bad Request", r#"{"error":"invalid_grant"}"#).await;
        let provider = TokenProvider::new(creds())
            .with_token_url(stub.base_url.clone())
            .with_clock(ManualClock::at(0));

        let err = provider.bearer_token().await.unwrap_err();
        assert!(matches!(err, SpinError::TokenRefresh(_)));
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_malformed_token_response_is_an_error() {
        let stub = spawn_stub("200 OK", r#"{"unexpected":"shape"}"#).await;
        let provider = TokenProvider::new(creds())
            .with_token_url(stub.base_url.clone())
            .with_clock(ManualClock::at(0));

        let err = provider.bearer_token().await.unwrap_err();
        assert!(matches!(err, SpinError::TokenRefresh(_)));
    }
}
