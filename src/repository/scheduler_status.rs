//! Scheduler status repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::SchedulerStatusRecord;
use super::pool::{DbError, DbPool};
use super::{format_datetime, parse_datetime, parse_datetime_opt};
use crate::models::SchedulerStatus;
use crate::schema::scheduler_status;
use crate::with_conn;

impl From<SchedulerStatusRecord> for SchedulerStatus {
    fn from(record: SchedulerStatusRecord) -> Self {
        SchedulerStatus {
            name: record.name,
            running: record.running,
            last_heartbeat: parse_datetime_opt(record.last_heartbeat),
            host: record.host,
            version: record.version,
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<&SchedulerStatus> for SchedulerStatusRecord {
    fn from(status: &SchedulerStatus) -> Self {
        SchedulerStatusRecord {
            name: status.name.clone(),
            running: status.running,
            last_heartbeat: status.last_heartbeat.map(format_datetime),
            host: status.host.clone(),
            version: status.version.clone(),
            updated_at: format_datetime(status.updated_at),
        }
    }
}

/// Scheduler status repository.
#[derive(Clone)]
pub struct SchedulerStatusRepository {
    pool: DbPool,
}

impl SchedulerStatusRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the status row for a scheduler name.
    pub async fn get(&self, name: &str) -> Result<Option<SchedulerStatus>, DbError> {
        with_conn!(self.pool, conn => {
            scheduler_status::table
                .find(name)
                .first::<SchedulerStatusRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(SchedulerStatus::from))
        })
    }

    /// List all scheduler status rows.
    pub async fn list(&self) -> Result<Vec<SchedulerStatus>, DbError> {
        with_conn!(self.pool, conn => {
            scheduler_status::table
                .order(scheduler_status::name.asc())
                .load::<SchedulerStatusRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(SchedulerStatus::from).collect())
        })
    }

    /// Upsert a status row (insert or replace by name).
    pub async fn upsert(&self, status: &SchedulerStatus) -> Result<(), DbError> {
        let record = SchedulerStatusRecord::from(status);
        with_conn!(self.pool, conn => {
            diesel::replace_into(scheduler_status::table)
                .values(&record)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }
}
