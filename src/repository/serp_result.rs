//! SERP result repository.
//!
//! Results and the tracked hits they produce for one keyword are written in
//! a single transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{NewSerpResult, NewTrackedHit, SerpResultRecord};
use super::pool::{DbError, DbPool};
use super::util::{from_json_column, to_json_column};
use super::format_datetime;
use crate::models::{OrganicResult, SearchResult};
use crate::schema::{serp_results, tracked_hits};
use crate::utils::urls::extract_domain;
use crate::with_conn;

impl TryFrom<SerpResultRecord> for SearchResult {
    type Error = diesel::result::Error;

    fn try_from(record: SerpResultRecord) -> Result<Self, Self::Error> {
        Ok(SearchResult {
            id: record.id,
            run_id: record.run_id,
            keyword_id: record.keyword_id,
            position: record.position,
            title: record.title,
            link: record.link,
            snippet: record.snippet,
            raw: from_json_column(&record.raw)?,
        })
    }
}

/// What was written for one keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedResults {
    /// Number of result rows inserted.
    pub results: usize,
    /// Entries dropped for lacking a position or link.
    pub skipped: usize,
    /// Links that matched a tracked domain, in rank order, as `(tracked_site_id, link)`.
    pub tracked_links: Vec<(i64, String)>,
}

/// SERP result repository.
#[derive(Clone)]
pub struct SerpResultRepository {
    pool: DbPool,
}

impl SerpResultRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist the organic results of one keyword search.
    ///
    /// Entries without a position or link are skipped. Every stored result
    /// whose domain appears in `tracked_domains` also gets a tracked hit.
    pub async fn record_keyword_results(
        &self,
        run_id: i64,
        keyword_id: i64,
        results: &[OrganicResult],
        tracked_domains: &HashMap<String, i64>,
        now: DateTime<Utc>,
    ) -> Result<RecordedResults, DbError> {
        let created_at = format_datetime(now);

        let mut rows = Vec::with_capacity(results.len());
        let mut recorded = RecordedResults::default();
        for result in results {
            let Some((position, link)) = result.ranked_link() else {
                recorded.skipped += 1;
                continue;
            };
            let tracked_site_id = tracked_domains.get(&extract_domain(link)).copied();
            rows.push((result, position, link, tracked_site_id, to_json_column(&result.raw)?));
        }

        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    for (result, position, link, tracked_site_id, raw) in &rows {
                        diesel::insert_into(serp_results::table)
                            .values(NewSerpResult {
                                run_id,
                                keyword_id,
                                position: *position,
                                title: result.title.as_deref(),
                                link,
                                snippet: result.snippet.as_deref(),
                                raw,
                                created_at: &created_at,
                            })
                            .execute(conn)
                            .await?;
                        recorded.results += 1;

                        if let Some(site_id) = tracked_site_id {
                            diesel::insert_into(tracked_hits::table)
                                .values(NewTrackedHit {
                                    tracked_site_id: *site_id,
                                    run_id,
                                    keyword_id,
                                    position: *position,
                                    url: link,
                                    detected_at: &created_at,
                                })
                                .execute(conn)
                                .await?;
                            recorded.tracked_links.push((*site_id, link.to_string()));
                        }
                    }
                    Ok(recorded)
                })
            })
            .await
        })
    }

    /// Results of a run ordered by position ascending.
    pub async fn for_run(&self, run_id: i64) -> Result<Vec<SearchResult>, DbError> {
        with_conn!(self.pool, conn => {
            serp_results::table
                .filter(serp_results::run_id.eq(run_id))
                .order((serp_results::position.asc(), serp_results::id.asc()))
                .load::<SerpResultRecord>(&mut conn)
                .await
                .and_then(|records| records.into_iter().map(SearchResult::try_from).collect())
        })
    }

    /// Number of results stored for a run.
    pub async fn count_for_run(&self, run_id: i64) -> Result<i64, DbError> {
        with_conn!(self.pool, conn => {
            serp_results::table
                .filter(serp_results::run_id.eq(run_id))
                .count()
                .get_result::<i64>(&mut conn)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KeywordSpec, RunKind};
    use crate::repository::test_support::setup_test_db;
    use serde_json::json;

    fn organic(position: Option<i32>, link: Option<&str>) -> OrganicResult {
        OrganicResult {
            position,
            title: Some("T".into()),
            link: link.map(str::to_string),
            snippet: None,
            raw: json!({"position": position, "link": link}),
        }
    }

    #[tokio::test]
    async fn test_invalid_entries_are_skipped() {
        let (ctx, _dir) = setup_test_db().await;
        let run = ctx.runs().start(RunKind::Hourly, Utc::now()).await.unwrap();
        let kw = ctx
            .keywords()
            .get_or_create(&KeywordSpec::normalize("seo", "US", None, None).unwrap())
            .await
            .unwrap();
        let tracked = HashMap::from([("a.com".to_string(), 1)]);
        ctx.tracked_sites().add("a.com", Utc::now()).await.unwrap();

        let recorded = ctx
            .results()
            .record_keyword_results(
                run.id,
                kw.id,
                &[
                    organic(Some(2), Some("https://www.a.com/y")),
                    organic(None, Some("https://a.com/no-position")),
                    organic(Some(3), None),
                    organic(Some(1), Some("https://b.com/")),
                ],
                &tracked,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(recorded.results, 2);
        assert_eq!(recorded.skipped, 2);
        assert_eq!(
            recorded.tracked_links,
            vec![(1, "https://www.a.com/y".to_string())]
        );

        let stored = ctx.results().for_run(run.id).await.unwrap();
        let positions: Vec<i32> = stored.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(ctx.tracked_sites().hits_for_run(run.id).await.unwrap().len(), 1);
    }
}
