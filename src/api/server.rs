//! Axum API server wiring.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::error::{Result, SpinError};
use crate::resolver::ArtistInfoResolver;
use crate::spotify::NowPlayingSource;

/// Shared state for all API handlers.
pub struct AppState {
    /// Artist info lookup pipeline (cache plus summarizer).
    pub resolver: ArtistInfoResolver,
    /// Playback source; `None` when Spotify credentials are not set, in which
    /// case `GET /api/now-playing` answers 503.
    pub now_playing: Option<Arc<dyn NowPlayingSource>>,
}

impl AppState {
    pub fn new(resolver: ArtistInfoResolver) -> Self {
        Self {
            resolver,
            now_playing: None,
        }
    }

    pub fn with_now_playing(mut self, source: Arc<dyn NowPlayingSource>) -> Self {
        self.now_playing = Some(source);
        self
    }
}

/// Build the axum router with all API routes.
///
/// `cors_origin`, when set, must parse as a header value or this returns
/// `SpinError::Config`. `static_dir`, when set, serves files for any path
/// not matched by an API route.
pub fn build_router(
    state: AppState,
    cors_origin: Option<&str>,
    static_dir: Option<PathBuf>,
) -> Result<Router> {
    let shared_state = Arc::new(state);

    let api = Router::new()
        .route(
            "/api/artist-info",
            post(super::routes::artist_info::post_artist_info),
        )
        .route(
            "/api/now-playing",
            get(super::routes::now_playing::get_now_playing),
        )
        .route("/api/health", get(super::routes::health::get_health))
        // Body size limit: 1 MiB.  Artist names are short; anything bigger
        // is rejected before JSON parsing.
        .layer(DefaultBodyLimit::max(1024 * 1024));

    // CORS: only allow requests from the configured frontend origin.
    let api = match cors_origin {
        Some(origin) => {
            let origin = origin.parse::<HeaderValue>().map_err(|e| {
                SpinError::Config(format!("Invalid CORS origin '{}': {}", origin, e))
            })?;
            let cors = CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([HeaderName::from_static("content-type")]);
            api.layer(cors)
        }
        None => api,
    };

    let api = api.with_state(shared_state);

    Ok(match static_dir {
        Some(dir) => api.fallback_service(tower_http::services::ServeDir::new(dir)),
        None => api,
    })
}

/// Start the API server and serve until the process is stopped.
pub async fn start_server(config: &Config, state: AppState) -> Result<()> {
    let app = build_router(
        state,
        config.cors_origin.as_deref(),
        config.static_dir.clone(),
    )?;
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
