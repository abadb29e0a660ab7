//! Search providers.

pub mod serper;

pub use serper::{SerperClient, DEFAULT_SERPER_BASE_URL};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Search API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid search response: {0}")]
    Decode(String),
    #[error("Search failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<SearchError>,
    },
    #[error("Search API key is not configured")]
    MissingApiKey,
}

impl SearchError {
    /// Transport failures and server errors are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A source of raw search result payloads.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search one query. `region` and `language` are sent only when given.
    async fn search(
        &self,
        query: &str,
        region: Option<&str>,
        language: Option<&str>,
    ) -> Result<serde_json::Value, SearchError>;
}
