//! Persistent artist-summary cache keyed by case-insensitive artist name.

pub mod artist_store;

pub use artist_store::{CacheEntry, SqliteArtistStore};

use async_trait::async_trait;

use crate::error::Result;

/// Storage seam for the artist-info cache.
///
/// Implementations report storage failures as errors; the resolver decides
/// what to do with them (it fails open, treating a read error as a miss and
/// dropping a failed write).
#[async_trait]
pub trait ArtistStore: Send + Sync {
    /// Case-insensitive lookup. `Ok(None)` when no entry exists.
    async fn get(&self, artist_name: &str) -> Result<Option<String>>;

    /// Upsert keyed by the case-insensitive name. Inserting records the
    /// given casing and sets `created_at`; updating refreshes `updated_at`
    /// and the text only.
    async fn put(&self, artist_name: &str, info_text: &str) -> Result<()>;
}

/// Lowercases an artist name for lookup and uniqueness purposes.
pub fn normalize_key(artist_name: &str) -> String {
    artist_name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_lowercases() {
        assert_eq!(normalize_key("Radiohead"), "radiohead");
        assert_eq!(normalize_key("RADIOHEAD"), "radiohead");
        assert_eq!(normalize_key("radiohead"), "radiohead");
    }

    #[test]
    fn test_normalize_key_keeps_interior_whitespace() {
        assert_eq!(normalize_key("The Beatles"), "the beatles");
    }
}
