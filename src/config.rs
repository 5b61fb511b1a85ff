//! Environment-driven service configuration.
//!
//! All settings come from the process environment (a `.env` file is loaded
//! first when present). Spotify credentials are optional as a group: with
//! none of them set the now-playing routes are disabled, with only some of
//! them set startup fails rather than limping along half-configured.

use std::path::PathBuf;

use crate::error::{Result, SpinError};

/// Credentials for the Spotify refresh-token flow.
#[derive(Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl SpotifyConfig {
    /// Assembles the credential group. All-absent yields `None`; a partial
    /// set is a configuration error naming the missing variables.
    pub fn from_parts(
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Option<Self>> {
        match (client_id, client_secret, refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(Some(Self {
                client_id,
                client_secret,
                refresh_token,
            })),
            (None, None, None) => Ok(None),
            (id, secret, token) => {
                let mut missing = Vec::new();
                if id.is_none() {
                    missing.push("SPOTIFY_CLIENT_ID");
                }
                if secret.is_none() {
                    missing.push("SPOTIFY_CLIENT_SECRET");
                }
                if token.is_none() {
                    missing.push("SPOTIFY_REFRESH_TOKEN");
                }
                Err(SpinError::Config(format!(
                    "Incomplete Spotify credentials, missing: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Service configuration.
#[derive(Clone)]
pub struct Config {
    /// Listen address.
    pub bind_addr: String,
    /// Listen port.
    pub port: u16,
    /// SQLite database file for the artist-info cache.
    pub database_path: PathBuf,
    /// Gemini API key. `None` defers to `GEMINI_API_KEY`/`GOOGLE_API_KEY`
    /// resolution at summarizer construction.
    pub gemini_api_key: Option<String>,
    /// Gemini model used for artist summaries.
    pub gemini_model: String,
    /// Timeout applied to each summarizer call, in seconds.
    pub summarizer_timeout_secs: u64,
    /// Spotify credentials; `None` disables the now-playing routes.
    pub spotify: Option<SpotifyConfig>,
    /// Exact origin allowed by CORS; `None` disables the CORS layer.
    pub cors_origin: Option<String>,
    /// Directory of static assets served as a fallback; `None` disables it.
    pub static_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("database_path", &self.database_path)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("summarizer_timeout_secs", &self.summarizer_timeout_secs)
            .field("spotify", &self.spotify)
            .field("cors_origin", &self.cors_origin)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8005,
            database_path: PathBuf::from("nowspinning.db"),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            summarizer_timeout_secs: 30,
            spotify: None,
            cors_origin: None,
            static_dir: None,
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let spotify = SpotifyConfig::from_parts(
            env_opt("SPOTIFY_CLIENT_ID"),
            env_opt("SPOTIFY_CLIENT_SECRET"),
            env_opt("SPOTIFY_REFRESH_TOKEN"),
        )?;

        Ok(Self {
            bind_addr: env_opt("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            database_path: env_opt("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_model: env_opt("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            summarizer_timeout_secs: std::env::var("SUMMARIZER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.summarizer_timeout_secs),
            spotify,
            cors_origin: env_opt("CORS_ORIGIN"),
            static_dir: env_opt("STATIC_DIR").map(PathBuf::from),
        })
    }
}

/// Reads an environment variable, mapping unset or empty to `None`.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
