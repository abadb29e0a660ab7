//! Dual-identity canonical/hreflang checks.
//!
//! A URL is fetched once as a generic bot and once as Googlebot. The stored
//! row mirrors the bot result at top level and nests both in `raw`.

pub mod fetcher;

pub use fetcher::{FetchOutcome, HttpPageFetcher, PageFetcher};

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::run::{close_run, RunOutcome, RunStats};
use super::ServiceError;
use crate::http_client::Identity;
use crate::models::{RunKind, TagComparison, TagPayload};
use crate::repository::{DbContext, DbError, NewTagCheck};

/// Runs tag checks and records them.
#[derive(Clone)]
pub struct TagReconciler {
    db: DbContext,
    fetcher: Arc<dyn PageFetcher>,
}

impl TagReconciler {
    pub fn new(db: DbContext, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { db, fetcher }
    }

    /// Fetch `url` as both identities and persist the comparison under `run_id`.
    ///
    /// Fetch failures are recorded in the comparison. Only storage errors
    /// are returned.
    pub async fn check(
        &self,
        run_id: i64,
        url: &str,
        region: Option<&str>,
        language: &str,
    ) -> Result<TagComparison, ServiceError> {
        debug!("Checking tags for {} (run {})", url, run_id);

        let (bot, googlebot) = tokio::join!(
            self.fetcher.fetch(url, Identity::Bot, language),
            self.fetcher.fetch(url, Identity::Googlebot, language),
        );
        let comparison = TagComparison {
            bot: bot.into_identity_tags(),
            googlebot: googlebot.into_identity_tags(),
        };

        let raw = TagPayload::from(comparison.clone());
        self.db
            .page_tags()
            .record(
                NewTagCheck {
                    run_id,
                    url,
                    region,
                    proxy_profile: None,
                    canonical: comparison.bot.canonical.as_deref(),
                    hreflang: comparison.bot.hreflang.as_ref(),
                    raw: &raw,
                },
                Utc::now(),
            )
            .await?;

        if comparison.is_mismatch() {
            info!(
                "Tag mismatch for {}: bot canonical {:?}, googlebot canonical {:?}",
                url, comparison.bot.canonical, comparison.googlebot.canonical
            );
        }

        Ok(comparison)
    }

    /// Tag-check a list of URLs under one run of `kind`.
    ///
    /// The first check that cannot be recorded fails the run and stops the
    /// remaining checks. Returns the comparisons made before that point.
    pub async fn check_pages(
        &self,
        kind: RunKind,
        urls: &[String],
        region: &str,
        language: &str,
    ) -> Result<(RunOutcome, Vec<TagComparison>), DbError> {
        let run = self.db.runs().start(kind, Utc::now()).await?;
        info!(
            "Run {} ({}) started for {} page(s)",
            run.id,
            kind.as_str(),
            urls.len()
        );

        let mut stats = RunStats::default();
        let mut comparisons = Vec::with_capacity(urls.len());
        let mut result = Ok(());
        for url in urls {
            stats.tag_checks += 1;
            match self.check(run.id, url, Some(region), language).await {
                Ok(comparison) => comparisons.push(comparison),
                Err(e) => {
                    stats.tag_failures += 1;
                    result = Err(e);
                    break;
                }
            }
        }

        let outcome = close_run(&self.db, run, result.map(|()| stats)).await?;
        Ok((outcome, comparisons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;
    use async_trait::async_trait;

    /// Serves a different canonical to Googlebot.
    struct CloakingFetcher;

    #[async_trait]
    impl PageFetcher for CloakingFetcher {
        async fn fetch(&self, _url: &str, identity: Identity, _language: &str) -> FetchOutcome {
            let html = match identity {
                Identity::Bot => r#"<link rel="canonical" href="https://a.com/bot">"#,
                Identity::Googlebot => {
                    r#"<link rel="canonical" href="https://a.com/google"><link rel="alternate" hreflang="en" href="https://a.com/">"#
                }
            };
            FetchOutcome {
                html: Some(html.into()),
                status: Some(200),
                ..Default::default()
            }
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl PageFetcher for FailingFetcher {
        async fn fetch(&self, _url: &str, _identity: Identity, _language: &str) -> FetchOutcome {
            FetchOutcome {
                error: Some("connection refused".into()),
                ..Default::default()
            }
        }
    }

    #[tokio::test]
    async fn test_check_records_both_identities() {
        let (ctx, _dir) = setup_test_db().await;
        let run = ctx.runs().start(RunKind::Ui, Utc::now()).await.unwrap();
        let reconciler = TagReconciler::new(ctx.clone(), Arc::new(CloakingFetcher));

        let comparison = reconciler
            .check(run.id, "https://a.com/", Some("IN"), "EN")
            .await
            .unwrap();
        assert!(comparison.is_mismatch());
        assert!(!comparison.has_failure());

        let tag = ctx
            .page_tags()
            .latest_for(run.id, "https://a.com/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tag.canonical.as_deref(), Some("https://a.com/bot"));
        assert_eq!(tag.hreflang, None);
        assert_eq!(tag.raw.comparison(), Some(comparison));

        let watch = ctx.page_tags().watch_url("https://a.com/").await.unwrap().unwrap();
        assert_eq!(watch.region, "IN");
    }

    #[tokio::test]
    async fn test_fetch_failures_are_recorded_not_raised() {
        let (ctx, _dir) = setup_test_db().await;
        let run = ctx.runs().start(RunKind::Ui, Utc::now()).await.unwrap();
        let reconciler = TagReconciler::new(ctx.clone(), Arc::new(FailingFetcher));

        let comparison = reconciler
            .check(run.id, "https://down.example/", None, "EN")
            .await
            .unwrap();
        assert!(comparison.has_failure());
        assert!(!comparison.is_mismatch());
        assert!(ctx
            .page_tags()
            .exists_for(run.id, "https://down.example/")
            .await
            .unwrap());
    }
}
