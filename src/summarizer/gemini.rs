//! Gemini-backed summarizer.
//!
//! Auth priority: config key → GEMINI_API_KEY → GOOGLE_API_KEY
//!
//! Gemini 2.5 models return parts tagged `thought: true`. Those are
//! intermediate reasoning steps and are filtered out of the summary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Result, SpinError};

use super::{summary_prompt, Summarizer};

/// Gemini v1beta REST API base.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

// ── Auth ─────────────────────────────────────────────────────────────────────

/// Authentication method for the Gemini REST API.
pub enum GeminiAuth {
    /// Standard API key, sent as the `?key=` query parameter.
    ApiKey(String),
    /// OAuth bearer token, sent as the `Authorization: Bearer` header.
    BearerToken(String),
}

impl std::fmt::Debug for GeminiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("GeminiAuth::ApiKey([REDACTED])"),
            Self::BearerToken(_) => f.write_str("GeminiAuth::BearerToken([REDACTED])"),
        }
    }
}

impl GeminiAuth {
    /// Resolve auth credentials in priority order: `explicit_key` (from
    /// config) first, then `env_key` (`GEMINI_API_KEY` or `GOOGLE_API_KEY`).
    pub fn resolve(explicit_key: Option<&str>, env_key: Option<&str>) -> Option<Self> {
        if let Some(k) = explicit_key.filter(|k| !k.is_empty()) {
            return Some(Self::ApiKey(k.to_string()));
        }
        if let Some(k) = env_key.filter(|k| !k.is_empty()) {
            return Some(Self::ApiKey(k.to_string()));
        }
        None
    }
}

// ── Summarizer ────────────────────────────────────────────────────────────────

/// Summarizer that speaks the Gemini `generateContent` REST API directly.
///
/// Use [`GeminiSummarizer::from_config`] to build from service config, or
/// [`GeminiSummarizer::new_with_key`] / [`GeminiSummarizer::new_with_token`]
/// for testing / manual construction.
pub struct GeminiSummarizer {
    auth: GeminiAuth,
    model: String,
    base_url: String,
    client: Client,
}

impl std::fmt::Debug for GeminiSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSummarizer")
            .field("auth", &self.auth)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiSummarizer {
    /// Build a summarizer that authenticates with an API key.
    pub fn new_with_key(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            auth: GeminiAuth::ApiKey(api_key.to_string()),
            model: model.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            client: Self::build_client(timeout),
        }
    }

    /// Build a summarizer that authenticates with a bearer token.
    pub fn new_with_token(bearer_token: &str, model: &str, timeout: Duration) -> Self {
        Self {
            auth: GeminiAuth::BearerToken(bearer_token.to_string()),
            model: model.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            client: Self::build_client(timeout),
        }
    }

    /// Build from an optional API key, resolving auth in priority order.
    ///
    /// Returns `None` when no credentials are available.
    pub fn from_config(api_key: Option<&str>, model: &str, timeout: Duration) -> Option<Self> {
        let env_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok();
        let auth = GeminiAuth::resolve(api_key, env_key.as_deref())?;
        Some(Self {
            auth,
            model: model.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            client: Self::build_client(timeout),
        })
    }

    /// Override the API base URL. Intended for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client")
    }

    /// Build the `generateContent` request body for a prompt.
    ///
    /// Google Search grounding is enabled so summaries of newer artists do
    /// not depend on the model's training cutoff.
    pub fn build_request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "tools": [{ "googleSearch": {} }]
        })
    }

    /// Extract summary text from a Gemini API response.
    ///
    /// Joins the non-thought parts of the first candidate. Whitespace-only
    /// output maps to `None` so callers never treat it as a usable summary.
    pub fn extract_text(response: &Value) -> Option<String> {
        let parts = response["candidates"][0]["content"]["parts"].as_array()?;

        let final_parts: Vec<&str> = parts
            .iter()
            .filter(|p| !p["thought"].as_bool().unwrap_or(false))
            .filter_map(|p| p["text"].as_str())
            .collect();

        let text = final_parts.join("");
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Build the full API URL for `generateContent`.
    fn api_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Attach authentication to the request builder.
    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            GeminiAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            GeminiAuth::BearerToken(token) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
        }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, artist_name: &str) -> Result<Option<String>> {
        let prompt = summary_prompt(artist_name);
        let body = Self::build_request_body(&prompt);

        debug!(model = %self.model, artist = artist_name, "Requesting artist summary");

        let request = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .json(&body);

        let request = self.apply_auth(request);

        let response = request
            .send()
            .await
            .map_err(|e| SpinError::Summarization(format!("Gemini request failed: {}", e)))?;

        if response.status().is_success() {
            let json: Value = response.json().await.map_err(|e| {
                SpinError::Summarization(format!("Failed to parse Gemini response: {}", e))
            })?;
            return Ok(Self::extract_text(&json));
        }

        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();

        // Try to extract a useful message from the Gemini error body.
        let body_msg = serde_json::from_str::<Value>(&error_text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(error_text);

        Err(SpinError::Summarization(format!(
            "Gemini API error (HTTP {}): {}",
            status, body_msg
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
