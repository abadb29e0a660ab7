//! Run orchestration: search, record, detect tracked hits, tag-check.
//!
//! Every run ends in exactly one terminal state. Results are committed per
//! keyword and discarded if the run later fails; tag checks survive either way.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::tags::TagReconciler;
use super::ServiceError;
use crate::models::{Keyword, Run, RunKind, TrackedSite, DEFAULT_LANGUAGE, DEFAULT_WATCH_REGION};
use crate::parsers::parse_organic;
use crate::providers::SearchProvider;
use crate::repository::{DbContext, DbError};

/// Region used for homepage checks of tracked sites.
const FAVORITES_REGION: &str = DEFAULT_WATCH_REGION;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success(Run),
    Failed { run: Run, error: String },
}

impl RunOutcome {
    pub fn run(&self) -> &Run {
        match self {
            Self::Success(run) | Self::Failed { run, .. } => run,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Turn a failed run into an error.
    pub fn into_result(self) -> Result<Run, ServiceError> {
        match self {
            Self::Success(run) => Ok(run),
            Self::Failed { run, error } => Err(ServiceError::RunFailed {
                run_id: run.id,
                error,
            }),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub keywords: usize,
    pub results: usize,
    pub skipped: usize,
    pub hits: usize,
    pub tag_checks: usize,
    pub tag_failures: usize,
}

/// Executes keyword runs.
#[derive(Clone)]
pub struct RunOrchestrator {
    db: DbContext,
    provider: Arc<dyn SearchProvider>,
    tags: TagReconciler,
}

impl RunOrchestrator {
    pub fn new(db: DbContext, provider: Arc<dyn SearchProvider>, tags: TagReconciler) -> Self {
        Self { db, provider, tags }
    }

    pub fn tags(&self) -> &TagReconciler {
        &self.tags
    }

    /// Run the given keywords under a new run of `kind`.
    ///
    /// Search or storage failures end the run as failed and are reported
    /// through [`RunOutcome::Failed`]. An error is returned only when the
    /// run itself could not be opened or closed.
    pub async fn run(&self, keywords: &[Keyword], kind: RunKind) -> Result<RunOutcome, DbError> {
        let run = self.db.runs().start(kind, Utc::now()).await?;
        info!(
            "Run {} ({}) started for {} keyword(s)",
            run.id,
            kind.as_str(),
            keywords.len()
        );

        let result = self.execute(run.id, keywords).await;
        close_run(&self.db, run, result).await
    }

    /// Tag-check the homepage of every tracked site under one `favorites` run.
    pub async fn sweep_favorites(&self, sites: &[TrackedSite]) -> Result<RunOutcome, DbError> {
        let urls: Vec<String> = sites.iter().map(TrackedSite::homepage).collect();
        let (outcome, _) = self
            .tags
            .check_pages(RunKind::Favorites, &urls, FAVORITES_REGION, DEFAULT_LANGUAGE)
            .await?;
        Ok(outcome)
    }

    async fn execute(&self, run_id: i64, keywords: &[Keyword]) -> Result<RunStats, ServiceError> {
        let tracked = self.db.tracked_sites().domain_map().await?;
        let mut stats = RunStats::default();

        for keyword in keywords {
            self.run_keyword(run_id, keyword, &tracked, &mut stats)
                .await?;
            stats.keywords += 1;
        }

        Ok(stats)
    }

    async fn run_keyword(
        &self,
        run_id: i64,
        keyword: &Keyword,
        tracked: &HashMap<String, i64>,
        stats: &mut RunStats,
    ) -> Result<(), ServiceError> {
        let payload = self
            .provider
            .search(
                &keyword.keyword,
                Some(&keyword.region),
                Some(&keyword.language),
            )
            .await?;
        let organic = parse_organic(&payload);

        let recorded = self
            .db
            .results()
            .record_keyword_results(run_id, keyword.id, &organic, tracked, Utc::now())
            .await?;
        stats.results += recorded.results;
        stats.skipped += recorded.skipped;
        stats.hits += recorded.tracked_links.len();

        for (_, link) in &recorded.tracked_links {
            match self.check_once(run_id, link, keyword).await {
                Ok(true) => stats.tag_checks += 1,
                Ok(false) => {}
                Err(e) => {
                    stats.tag_checks += 1;
                    stats.tag_failures += 1;
                    warn!("Tag check failed for {} (run {}): {}", link, run_id, e);
                }
            }
        }

        Ok(())
    }

    /// Tag-check `link` unless this run already holds a record for it.
    ///
    /// Returns whether a check was made. Errors never fail the run.
    async fn check_once(
        &self,
        run_id: i64,
        link: &str,
        keyword: &Keyword,
    ) -> Result<bool, ServiceError> {
        if self.db.page_tags().exists_for(run_id, link).await? {
            return Ok(false);
        }
        self.tags
            .check(run_id, link, Some(&keyword.region), &keyword.language)
            .await?;
        Ok(true)
    }
}

/// Write the terminal state of a run and read it back.
pub(crate) async fn close_run(
    db: &DbContext,
    run: Run,
    result: Result<RunStats, ServiceError>,
) -> Result<RunOutcome, DbError> {
    let runs = db.runs();
    match result {
        Ok(stats) => {
            runs.finish_success(run.id, Utc::now()).await?;
            info!(
                "Run {} succeeded: {} results, {} skipped, {} hits, {} tag checks ({} failed)",
                run.id,
                stats.results,
                stats.skipped,
                stats.hits,
                stats.tag_checks,
                stats.tag_failures
            );
            let run = runs.get(run.id).await?.unwrap_or(run);
            Ok(RunOutcome::Success(run))
        }
        Err(e) => {
            let message = e.to_string();
            runs.finish_failed(run.id, &message, Utc::now()).await?;
            error!("Run {} failed: {}", run.id, message);
            let run = runs.get(run.id).await?.unwrap_or(run);
            Ok(RunOutcome::Failed {
                run,
                error: message,
            })
        }
    }
}
