//! Service error types.

use thiserror::Error;

use crate::providers::SearchError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Run {run_id} failed: {error}")]
    RunFailed { run_id: i64, error: String },
}
