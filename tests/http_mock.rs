//! HTTP behaviour against a local mock server.
//!
//! Covers the Serper client and the page fetcher retry rules.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use serpwatch::http_client::{Identity, RetryPolicy};
use serpwatch::providers::{SearchError, SearchProvider, SerperClient};
use serpwatch::services::{HttpPageFetcher, PageFetcher};

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

impl Hits {
    fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn serper(addr: SocketAddr) -> SerperClient {
    SerperClient::new(reqwest::Client::new(), "test-key", format!("http://{}", addr))
        .with_retry(RetryPolicy::immediate(3))
}

fn fetcher() -> HttpPageFetcher {
    HttpPageFetcher::new(reqwest::Client::new()).with_retry(RetryPolicy::immediate(3))
}

#[tokio::test]
async fn test_serper_sends_key_and_body() {
    async fn search(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
        }
        (
            StatusCode::OK,
            Json(json!({"echo": body, "organic": [{"position": 1, "link": "https://a.com/"}]})),
        )
    }

    let addr = serve(Router::new().route("/search", post(search))).await;
    let payload = serper(addr)
        .search("Seo Tools", Some("IN"), Some("EN"))
        .await
        .unwrap();

    assert_eq!(payload["echo"], json!({"q": "Seo Tools", "gl": "in", "hl": "en"}));
    assert_eq!(payload["organic"][0]["link"], "https://a.com/");
}

#[tokio::test]
async fn test_serper_retries_server_errors_then_gives_up() {
    async fn search(State(hits): State<Hits>) -> impl IntoResponse {
        hits.bump();
        (StatusCode::INTERNAL_SERVER_ERROR, "upstream down")
    }

    let hits = Hits::default();
    let app = Router::new()
        .route("/search", post(search))
        .with_state(hits.clone());
    let addr = serve(app).await;

    let err = serper(addr).search("seo", Some("US"), None).await.unwrap_err();
    assert_eq!(hits.count(), 3);
    match err {
        SearchError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, SearchError::Status { status: 500, .. }));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_serper_recovers_after_transient_error() {
    async fn search(State(hits): State<Hits>) -> impl IntoResponse {
        if hits.bump() == 1 {
            return (StatusCode::BAD_GATEWAY, Json(json!({})));
        }
        (StatusCode::OK, Json(json!({"organic": []})))
    }

    let hits = Hits::default();
    let app = Router::new()
        .route("/search", post(search))
        .with_state(hits.clone());
    let addr = serve(app).await;

    let payload = serper(addr).search("seo", Some("US"), None).await.unwrap();
    assert_eq!(payload, json!({"organic": []}));
    assert_eq!(hits.count(), 2);
}

#[tokio::test]
async fn test_serper_does_not_retry_client_errors() {
    async fn search(State(hits): State<Hits>) -> impl IntoResponse {
        hits.bump();
        (StatusCode::NOT_FOUND, "no such route")
    }

    let hits = Hits::default();
    let app = Router::new()
        .route("/search", post(search))
        .with_state(hits.clone());
    let addr = serve(app).await;

    let err = serper(addr).search("seo", Some("US"), None).await.unwrap_err();
    assert_eq!(hits.count(), 1);
    assert!(matches!(err, SearchError::Status { status: 404, ref body } if body == "no such route"));
}

#[tokio::test]
async fn test_serper_rejects_non_json_body() {
    async fn search() -> &'static str {
        "<html>not json</html>"
    }

    let addr = serve(Router::new().route("/search", post(search))).await;
    let err = serper(addr).search("seo", Some("US"), None).await.unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)));
}

#[tokio::test]
async fn test_fetcher_retries_rate_limit() {
    async fn page(State(hits): State<Hits>) -> impl IntoResponse {
        if hits.bump() < 3 {
            return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
        }
        (
            [(header::CONTENT_TYPE, "text/html")],
            r#"<link rel="canonical" href="https://a.com/">"#,
        )
            .into_response()
    }

    let hits = Hits::default();
    let app = Router::new().route("/", get(page)).with_state(hits.clone());
    let addr = serve(app).await;

    let outcome = fetcher()
        .fetch(&format!("http://{}/", addr), Identity::Bot, "EN")
        .await;
    assert_eq!(hits.count(), 3);
    assert_eq!(outcome.status, Some(200));
    assert_eq!(outcome.error, None);

    let tags = outcome.into_identity_tags();
    assert_eq!(tags.canonical.as_deref(), Some("https://a.com/"));
    assert_eq!(tags.hreflang, None);
}

#[tokio::test]
async fn test_fetcher_does_not_retry_not_found() {
    async fn page(State(hits): State<Hits>) -> impl IntoResponse {
        hits.bump();
        (StatusCode::NOT_FOUND, r#"<link rel="canonical" href="https://a.com/404">"#)
    }

    let hits = Hits::default();
    let app = Router::new().route("/", get(page)).with_state(hits.clone());
    let addr = serve(app).await;

    let outcome = fetcher()
        .fetch(&format!("http://{}/", addr), Identity::Bot, "EN")
        .await;
    assert_eq!(hits.count(), 1);
    assert_eq!(outcome.status, Some(404));
    assert_eq!(outcome.error.as_deref(), Some("HTTP 404 Not Found"));

    let tags = outcome.into_identity_tags();
    assert!(tags.is_failure());
    assert_eq!(tags.canonical, None);
}

#[tokio::test]
async fn test_fetcher_sends_identity_headers_and_reads_link_header() {
    async fn page(headers: HeaderMap) -> impl IntoResponse {
        let ua = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let lang = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let body = format!(
            r#"<meta name="ua" content="{}"><meta name="lang" content="{}">"#,
            ua, lang
        );
        (
            [(
                header::LINK,
                r#"<https://a.com/x>; rel="alternate"; hreflang="x-default""#,
            )],
            body,
        )
    }

    let addr = serve(Router::new().route("/", get(page))).await;
    let url = format!("http://{}/", addr);

    let outcome = fetcher().fetch(&url, Identity::Googlebot, "DE").await;
    let html = outcome.html.as_deref().unwrap();
    assert!(html.contains("Googlebot/2.1"));
    assert!(html.contains("de-DE,de;q=0.9"));
    assert!(outcome.link_header.is_some());

    let tags = outcome.into_identity_tags();
    assert_eq!(tags.hreflang.unwrap()["x-default"], "https://a.com/x");
}

#[tokio::test]
async fn test_fetcher_captures_connection_errors() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = HttpPageFetcher::new(reqwest::Client::new())
        .with_retry(RetryPolicy::immediate(1))
        .fetch(&format!("http://{}/", addr), Identity::Bot, "EN")
        .await;
    assert_eq!(outcome.status, None);
    assert!(outcome.error.is_some());
    assert!(outcome.into_identity_tags().is_failure());
}
