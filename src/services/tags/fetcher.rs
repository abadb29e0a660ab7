//! Page fetching under a client identity.
//!
//! Fetch problems never surface as errors: they are captured in the
//! [`FetchOutcome`] so both identities can always be compared.

use async_trait::async_trait;
use reqwest::header::LINK;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::http_client::{Identity, RetryPolicy};
use crate::models::{IdentityTags, PageTags};
use crate::parsers::parse_tags;

/// What a single page fetch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub html: Option<String>,
    pub link_header: Option<String>,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl FetchOutcome {
    /// Blocked or rate limited; the only statuses worth retrying.
    pub fn is_throttled(&self) -> bool {
        matches!(
            self.status.and_then(|s| StatusCode::from_u16(s).ok()),
            Some(StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        )
    }

    /// Extracted tags plus the fetch status.
    pub fn into_identity_tags(self) -> IdentityTags {
        let PageTags {
            canonical,
            hreflang,
        } = match (&self.html, &self.error) {
            (Some(html), None) => parse_tags(html, self.link_header.as_deref()),
            _ => PageTags::default(),
        };

        IdentityTags {
            canonical,
            hreflang,
            status: self.status,
            error: self.error,
        }
    }
}

/// Fetches a URL as a given identity.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, identity: Identity, language: &str) -> FetchOutcome;
}

/// reqwest-backed page fetcher.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, url: &str, identity: Identity, language: &str) -> FetchOutcome {
        let response = match self
            .client
            .get(url)
            .headers(identity.headers(language))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return FetchOutcome {
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };

        let status = response.status();
        let link_header = response
            .headers()
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        let link_header = (!link_header.is_empty()).then_some(link_header);

        if !status.is_success() {
            return FetchOutcome {
                html: None,
                link_header,
                status: Some(status.as_u16()),
                error: Some(format!("HTTP {}", status)),
            };
        }

        match response.text().await {
            Ok(html) => FetchOutcome {
                html: Some(html),
                link_header,
                status: Some(status.as_u16()),
                error: None,
            },
            Err(e) => FetchOutcome {
                html: None,
                link_header,
                status: Some(status.as_u16()),
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, identity: Identity, language: &str) -> FetchOutcome {
        let attempted = self
            .retry
            .run(
                |_| self.fetch_once(url, identity, language),
                FetchOutcome::is_throttled,
            )
            .await;

        debug!(
            "Fetched {} as {} in {} attempt(s): status={:?}",
            url,
            identity.as_str(),
            attempted.attempts,
            attempted.outcome.status
        );
        attempted.outcome
    }
}
