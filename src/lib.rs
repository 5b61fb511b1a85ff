//! nowspinning: a small backend for music display frontends.
//!
//! Serves three things over HTTP: one-sentence artist summaries (generated
//! by Gemini and cached forever in SQLite), the currently playing Spotify
//! track, and a health probe. The artist cache is keyed case-insensitively
//! so "Miles Davis" and "miles davis" share an entry.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod resolver;
pub mod spotify;
pub mod summarizer;

pub use error::{Result, SpinError};
