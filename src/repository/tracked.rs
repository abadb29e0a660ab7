//! Tracked site and hit repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewTrackedSite, TrackedHitRecord, TrackedSiteRecord};
use super::pool::{DbError, DbPool};
use super::{format_datetime, parse_datetime};
use crate::models::{TrackedHit, TrackedSite};
use crate::schema::{tracked_hits, tracked_sites};
use crate::with_conn;

impl From<TrackedSiteRecord> for TrackedSite {
    fn from(record: TrackedSiteRecord) -> Self {
        TrackedSite {
            id: record.id,
            domain: record.domain,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

impl From<TrackedHitRecord> for TrackedHit {
    fn from(record: TrackedHitRecord) -> Self {
        TrackedHit {
            id: record.id,
            tracked_site_id: record.tracked_site_id,
            run_id: record.run_id,
            keyword_id: record.keyword_id,
            position: record.position,
            url: record.url,
            detected_at: parse_datetime(&record.detected_at),
        }
    }
}

/// Tracked site repository.
#[derive(Clone)]
pub struct TrackedSiteRepository {
    pool: DbPool,
}

impl TrackedSiteRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Track a domain. Adding an already tracked domain returns the existing row.
    ///
    /// `domain` must already be normalized (see [`crate::utils::urls::normalize_domain`]).
    pub async fn add(&self, domain: &str, now: DateTime<Utc>) -> Result<TrackedSite, DbError> {
        let created_at = format_datetime(now);
        with_conn!(self.pool, conn => {
            diesel::insert_or_ignore_into(tracked_sites::table)
                .values(NewTrackedSite {
                    domain,
                    created_at: &created_at,
                })
                .execute(&mut conn)
                .await?;

            tracked_sites::table
                .filter(tracked_sites::domain.eq(domain))
                .first::<TrackedSiteRecord>(&mut conn)
                .await
                .map(TrackedSite::from)
        })
    }

    /// Stop tracking a domain. Hits recorded for it are removed with it.
    pub async fn remove(&self, domain: &str) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let rows = diesel::delete(tracked_sites::table.filter(tracked_sites::domain.eq(domain)))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// List tracked sites ordered by domain.
    pub async fn list(&self) -> Result<Vec<TrackedSite>, DbError> {
        with_conn!(self.pool, conn => {
            tracked_sites::table
                .order(tracked_sites::domain.asc())
                .load::<TrackedSiteRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(TrackedSite::from).collect())
        })
    }

    /// Domain to site ID lookup for hit detection.
    pub async fn domain_map(&self) -> Result<HashMap<String, i64>, DbError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|site| (site.domain, site.id))
            .collect())
    }

    /// Hits recorded during a run, in insertion order.
    pub async fn hits_for_run(&self, run_id: i64) -> Result<Vec<TrackedHit>, DbError> {
        with_conn!(self.pool, conn => {
            tracked_hits::table
                .filter(tracked_hits::run_id.eq(run_id))
                .order(tracked_hits::id.asc())
                .load::<TrackedHitRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(TrackedHit::from).collect())
        })
    }

    /// Most recent hits for a tracked site, newest first.
    pub async fn hits_for_site(
        &self,
        tracked_site_id: i64,
        limit: i64,
    ) -> Result<Vec<TrackedHit>, DbError> {
        with_conn!(self.pool, conn => {
            tracked_hits::table
                .filter(tracked_hits::tracked_site_id.eq(tracked_site_id))
                .order(tracked_hits::id.desc())
                .limit(limit)
                .load::<TrackedHitRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(TrackedHit::from).collect())
        })
    }
}
