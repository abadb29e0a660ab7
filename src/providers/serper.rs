//! Serper (google.serper.dev) search client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{SearchError, SearchProvider};
use crate::http_client::RetryPolicy;

pub const DEFAULT_SERPER_BASE_URL: &str = "https://google.serper.dev";

/// Longest error body kept in a status error.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hl: Option<String>,
}

impl<'a> SearchRequest<'a> {
    fn new(query: &'a str, region: Option<&str>, language: Option<&str>) -> Self {
        let lower = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
        };
        Self {
            q: query,
            gl: lower(region),
            hl: lower(language),
        }
    }
}

/// Serper API client.
#[derive(Clone)]
pub struct SerperClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl SerperClient {
    pub fn new(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }

    async fn search_once(&self, request: &SearchRequest<'_>) -> Result<Value, SearchError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("X-API-KEY", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(
        &self,
        query: &str,
        region: Option<&str>,
        language: Option<&str>,
    ) -> Result<Value, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::MissingApiKey);
        }

        let request = SearchRequest::new(query, region, language);
        debug!("Searching '{}' (gl={:?}, hl={:?})", query, request.gl, request.hl);

        let attempted = self
            .retry
            .run(
                |_| self.search_once(&request),
                |outcome| matches!(outcome, Err(e) if e.is_transient()),
            )
            .await;

        match attempted.outcome {
            Err(e) if e.is_transient() => Err(SearchError::Exhausted {
                attempts: attempted.attempts,
                last: Box::new(e),
            }),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_lowercases_and_omits() {
        let body = serde_json::to_value(SearchRequest::new("seo tools", Some("IN"), Some("EN"))).unwrap();
        assert_eq!(body, serde_json::json!({"q": "seo tools", "gl": "in", "hl": "en"}));

        let body = serde_json::to_value(SearchRequest::new("seo", Some("US"), None)).unwrap();
        assert_eq!(body, serde_json::json!({"q": "seo", "gl": "us"}));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = SerperClient::new(Client::new(), "k", "http://localhost:1234/");
        assert_eq!(client.endpoint(), "http://localhost:1234/search");
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client = SerperClient::new(Client::new(), "", "http://127.0.0.1:9");
        let err = client.search("seo", None, None).await.unwrap_err();
        assert!(matches!(err, SearchError::MissingApiKey));
    }
}
