//! Artist summarization capability.

pub mod gemini;

pub use gemini::{GeminiAuth, GeminiSummarizer};

use async_trait::async_trait;

use crate::error::Result;

/// Generates a one-sentence artist summary.
///
/// `Ok(None)` means the provider answered but produced no usable text;
/// callers must not cache that. An `Err` means the call itself failed.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, artist_name: &str) -> Result<Option<String>>;
}

/// Fixed prompt template for artist summaries.
pub fn summary_prompt(artist_name: &str) -> String {
    format!(
        "Give a one sentence summary of the musical artist {}",
        artist_name
    )
}
