//! Artist info resolution: cache first, then the summarizer.
//!
//! Storage failures never fail a resolve call. A failed read degrades to a
//! miss and a failed write is dropped, so cache unavailability means "always
//! regenerate", not an outage. Summarizer failures do propagate.
//!
//! Concurrent misses for the same artist are coalesced behind a per-key
//! gate, so one summarizer call serves all of them. Distinct artists never
//! contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{normalize_key, ArtistStore};
use crate::error::{Result, SpinError};
use crate::summarizer::Summarizer;

/// Outcome of a resolve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The summary, if one exists or was generated.
    pub text: Option<String>,
    /// Whether the text came from the cache.
    pub cached: bool,
}

/// Resolves artist names to summaries through the cache.
pub struct ArtistInfoResolver {
    store: Arc<dyn ArtistStore>,
    summarizer: Arc<dyn Summarizer>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl ArtistInfoResolver {
    pub fn new(store: Arc<dyn ArtistStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            store,
            summarizer,
            in_flight: DashMap::new(),
        }
    }

    /// Returns the cached summary for `artist_name`, generating and caching
    /// one on a miss.
    ///
    /// Fails with [`SpinError::InvalidInput`] on an empty name (before any
    /// cache access) and with [`SpinError::Summarization`] when the
    /// generation call itself fails. An empty generation result is a
    /// success with `text: None` and is never cached.
    pub async fn resolve(&self, artist_name: &str) -> Result<Resolution> {
        if artist_name.trim().is_empty() {
            return Err(SpinError::InvalidInput(
                "artistName must be a non-empty string".to_string(),
            ));
        }

        // Fast path: no gate for artists already cached.
        if let Some(text) = self.cache_get(artist_name).await {
            debug!(artist = artist_name, "Serving cached artist info");
            return Ok(Resolution {
                text: Some(text),
                cached: true,
            });
        }

        let key = normalize_key(artist_name);
        let gate = self.in_flight.entry(key.clone()).or_default().clone();
        let result = {
            let _guard = gate.lock().await;

            // A concurrent miss for the same key may have filled the cache
            // while we waited on the gate.
            match self.cache_get(artist_name).await {
                Some(text) => Ok(Resolution {
                    text: Some(text),
                    cached: true,
                }),
                None => self.generate(artist_name).await,
            }
        };

        // Prune the gate once nobody else waits on this key; `gate` and the
        // map entry hold the remaining two references.
        self.in_flight.remove_if(&key, |_, g| Arc::strong_count(g) <= 2);

        result
    }

    /// Cache lookup with the fail-open policy applied.
    async fn cache_get(&self, artist_name: &str) -> Option<String> {
        match self.store.get(artist_name).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(artist = artist_name, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Miss path: call the summarizer and cache any non-empty result.
    async fn generate(&self, artist_name: &str) -> Result<Resolution> {
        let text = self.summarizer.summarize(artist_name).await?;

        let Some(text) = text else {
            debug!(artist = artist_name, "Summarizer returned no text, nothing cached");
            return Ok(Resolution {
                text: None,
                cached: false,
            });
        };

        // Best-effort write: a storage failure must not fail the request.
        if let Err(e) = self.store.put(artist_name, &text).await {
            warn!(artist = artist_name, error = %e, "Cache write dropped");
        }

        Ok(Resolution {
            text: Some(text),
            cached: false,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
