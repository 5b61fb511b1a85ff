//! Service entry point: load config, open the cache, wire the summarizer
//! and the optional Spotify proxy, then serve the API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nowspinning::api::{start_server, AppState};
use nowspinning::cache::SqliteArtistStore;
use nowspinning::config::Config;
use nowspinning::resolver::ArtistInfoResolver;
use nowspinning::spotify::{NowPlayingClient, TokenProvider};
use nowspinning::summarizer::GeminiSummarizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env().context("loading configuration")?;

    let store = Arc::new(
        SqliteArtistStore::open(&config.database_path).context("opening artist info cache")?,
    );

    let summarizer = GeminiSummarizer::from_config(
        config.gemini_api_key.as_deref(),
        &config.gemini_model,
        Duration::from_secs(config.summarizer_timeout_secs),
    )
    .context("no Gemini credentials: set GEMINI_API_KEY or GOOGLE_API_KEY")?;

    let resolver = ArtistInfoResolver::new(store, Arc::new(summarizer));
    let mut state = AppState::new(resolver);

    match config.spotify.clone() {
        Some(credentials) => {
            let tokens = Arc::new(TokenProvider::new(credentials));
            state = state.with_now_playing(Arc::new(NowPlayingClient::new(tokens)));
        }
        None => {
            tracing::warn!("Spotify credentials not set, now-playing endpoint disabled");
        }
    }

    start_server(&config, state).await.context("API server")?;
    Ok(())
}

/// Log filtering comes from `NOWSPINNING_LOG` (default `info`);
/// `NOWSPINNING_LOG_FORMAT=json` switches to line-delimited JSON output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("NOWSPINNING_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("NOWSPINNING_LOG_FORMAT")
        .is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
