//! HTTP plumbing shared by the search provider and the page fetcher.

mod identity;
mod retry;

pub use identity::{accept_language, Identity, DEFAULT_ACCEPT_LANGUAGE, USER_AGENT};
pub use retry::{Attempted, RetryPolicy};

use std::time::Duration;

use reqwest::{redirect, Client};

/// Maximum redirects followed by page fetches.
const MAX_REDIRECTS: usize = 10;

/// Build the shared HTTP client.
///
/// Identity-specific headers are set per request; the client carries the
/// default user agent, compression, and redirect policy.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}
