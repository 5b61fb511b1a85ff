//! SQLite-backed artist-info store.
//!
//! One row per case-insensitive artist name: the lowercased name is the
//! primary key, the casing of the first write is kept for display. Writes
//! are atomic upserts so concurrent writers for one key cannot produce
//! duplicate rows or lost updates.
//!
//! # Example
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use nowspinning::cache::{ArtistStore, SqliteArtistStore};
//!
//! let store = SqliteArtistStore::open_in_memory().unwrap();
//! store.put("Radiohead", "An English rock band.").await.unwrap();
//! assert_eq!(
//!     store.get("RADIOHEAD").await.unwrap().as_deref(),
//!     Some("An English rock band."),
//! );
//! # });
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Result, SpinError};

use super::{normalize_key, ArtistStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS artist_info_cache (
    artist_key  TEXT PRIMARY KEY,    -- lowercased artist name
    artist_name TEXT NOT NULL,       -- casing of the first write
    info_text   TEXT NOT NULL,
    created_at  INTEGER NOT NULL,    -- epoch seconds
    updated_at  INTEGER NOT NULL     -- epoch seconds
);
"#;

/// A cached artist summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Artist name as first written.
    pub artist_name: String,
    /// The generated summary.
    pub info_text: String,
    /// Unix timestamp of the first write.
    pub created_at: i64,
    /// Unix timestamp of the latest write.
    pub updated_at: i64,
}

/// SQLite-backed [`ArtistStore`].
pub struct SqliteArtistStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteArtistStore {
    /// Opens (creating if absent) the database at `path` and ensures the
    /// schema exists. Idempotent; safe to run on every startup.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| SpinError::Cache(format!("failed to open {}: {}", path.display(), e)))?;

        init_schema(&conn)
            .map_err(|e| SpinError::Cache(format!("failed to initialize schema: {}", e)))?;

        info!(path = %path.display(), "Artist info cache ready");
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SpinError::Cache(format!("failed to open in-memory db: {}", e)))?;
        init_schema(&conn)
            .map_err(|e| SpinError::Cache(format!("failed to initialize schema: {}", e)))?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs a closure against the connection, mapping storage errors into
    /// [`SpinError::Cache`].
    async fn with_connection<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<R> + Send,
        R: Send,
    {
        let conn = self.connection.lock().await;
        f(&conn).map_err(|e| SpinError::Cache(e.to_string()))
    }

    /// Full row for an artist, including timestamps and first-write casing.
    pub async fn get_entry(&self, artist_name: &str) -> Result<Option<CacheEntry>> {
        let key = normalize_key(artist_name);
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT artist_name, info_text, created_at, updated_at
                 FROM artist_info_cache WHERE artist_key = ?1",
            )?;
            stmt.query_row([key.as_str()], |row| {
                Ok(CacheEntry {
                    artist_name: row.get(0)?,
                    info_text: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })
            .optional()
        })
        .await
    }

    /// Upsert with an explicit write timestamp.
    async fn put_at(&self, artist_name: &str, info_text: &str, now: i64) -> Result<()> {
        let key = normalize_key(artist_name);
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO artist_info_cache
                     (artist_key, artist_name, info_text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(artist_key) DO UPDATE SET
                     info_text = excluded.info_text,
                     updated_at = excluded.updated_at",
                params![key, artist_name, info_text, now],
            )?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ArtistStore for SqliteArtistStore {
    async fn get(&self, artist_name: &str) -> Result<Option<String>> {
        let key = normalize_key(artist_name);
        self.with_connection(move |conn| {
            let mut stmt =
                conn.prepare("SELECT info_text FROM artist_info_cache WHERE artist_key = ?1")?;
            stmt.query_row([key.as_str()], |row| row.get(0)).optional()
        })
        .await
    }

    async fn put(&self, artist_name: &str, info_text: &str) -> Result<()> {
        self.put_at(artist_name, info_text, now_unix()).await
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.execute_batch(SCHEMA)
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
