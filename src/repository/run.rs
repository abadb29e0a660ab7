//! Run repository.
//!
//! Terminal transitions are guarded on `status = 'running'` so each run
//! finishes exactly once. Failing a run discards its search results and
//! tracked hits in the same transaction; tag checks are kept.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{NewRun, RunRecord};
use super::pool::{DbError, DbPool};
use super::util::{LastInsertRowId, LAST_INSERT_ROWID};
use super::{format_datetime, parse_datetime, parse_datetime_opt};
use crate::models::{truncate_error, Run, RunKind, RunStatus};
use crate::schema::{runs, serp_results, tracked_hits};
use crate::with_conn;

impl TryFrom<RunRecord> for Run {
    type Error = diesel::result::Error;

    fn try_from(record: RunRecord) -> Result<Self, Self::Error> {
        Ok(Run {
            id: record.id,
            kind: RunKind::from_str(&record.kind).ok_or_else(|| {
                diesel::result::Error::DeserializationError(
                    format!("Invalid run kind: '{}'", record.kind).into(),
                )
            })?,
            status: RunStatus::from_str(&record.status).ok_or_else(|| {
                diesel::result::Error::DeserializationError(
                    format!("Invalid run status: '{}'", record.status).into(),
                )
            })?,
            started_at: parse_datetime(&record.started_at),
            finished_at: parse_datetime_opt(record.finished_at),
            error: record.error,
        })
    }
}

/// Run repository.
#[derive(Clone)]
pub struct RunRepository {
    pool: DbPool,
}

impl RunRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a run in the `running` state.
    pub async fn start(&self, kind: RunKind, now: DateTime<Utc>) -> Result<Run, DbError> {
        let started_at = format_datetime(now);
        with_conn!(self.pool, conn => {
            diesel::insert_into(runs::table)
                .values(NewRun {
                    kind: kind.as_str(),
                    status: RunStatus::Running.as_str(),
                    started_at: &started_at,
                })
                .execute(&mut conn)
                .await?;
            let row: LastInsertRowId = diesel::sql_query(LAST_INSERT_ROWID)
                .get_result(&mut conn)
                .await?;

            Ok(Run {
                id: row.id,
                kind,
                status: RunStatus::Running,
                started_at: parse_datetime(&started_at),
                finished_at: None,
                error: None,
            })
        })
    }

    /// Transition a running run to `success`.
    ///
    /// Returns false if the run was not in the `running` state.
    pub async fn finish_success(&self, id: i64, now: DateTime<Utc>) -> Result<bool, DbError> {
        self.finish(id, RunStatus::Success, None, now).await
    }

    /// Transition a running run to `failed`, storing a truncated error and
    /// removing the results and hits it recorded.
    ///
    /// Returns false if the run was not in the `running` state.
    pub async fn finish_failed(
        &self,
        id: i64,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        self.finish(id, RunStatus::Failed, Some(truncate_error(error)), now)
            .await
    }

    async fn finish(
        &self,
        id: i64,
        status: RunStatus,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let finished_at = format_datetime(now);
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    let rows = diesel::update(
                        runs::table
                            .filter(runs::id.eq(id))
                            .filter(runs::status.eq(RunStatus::Running.as_str())),
                    )
                    .set((
                        runs::status.eq(status.as_str()),
                        runs::finished_at.eq(&finished_at),
                        runs::error.eq(error),
                    ))
                    .execute(conn)
                    .await?;

                    if rows > 0 && status == RunStatus::Failed {
                        diesel::delete(tracked_hits::table.filter(tracked_hits::run_id.eq(id)))
                            .execute(conn)
                            .await?;
                        diesel::delete(serp_results::table.filter(serp_results::run_id.eq(id)))
                            .execute(conn)
                            .await?;
                    }
                    Ok(rows > 0)
                })
            })
            .await
        })
    }

    /// Get a run by ID.
    pub async fn get(&self, id: i64) -> Result<Option<Run>, DbError> {
        with_conn!(self.pool, conn => {
            runs::table
                .find(id)
                .first::<RunRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(Run::try_from).transpose())
        })
    }

    /// Most recent runs, newest first, optionally filtered by kind.
    pub async fn latest(&self, kind: Option<RunKind>, limit: i64) -> Result<Vec<Run>, DbError> {
        with_conn!(self.pool, conn => {
            let mut query = runs::table.order(runs::id.desc()).limit(limit).into_boxed();
            if let Some(kind) = kind {
                query = query.filter(runs::kind.eq(kind.as_str()));
            }
            query
                .load::<RunRecord>(&mut conn)
                .await
                .and_then(|records| records.into_iter().map(Run::try_from).collect())
        })
    }
}
