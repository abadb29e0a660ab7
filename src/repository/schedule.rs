//! Keyword schedule repository, including the due-set query.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{KeywordScheduleRecord, NewKeywordSchedule};
use super::pool::{DbError, DbPool};
use super::util::{LastInsertRowId, LAST_INSERT_ROWID};
use super::{format_datetime, parse_datetime, parse_datetime_opt};
use crate::models::{clamp_interval_hours, KeywordSchedule};
use crate::schema::keyword_schedules;
use crate::with_conn;

impl From<KeywordScheduleRecord> for KeywordSchedule {
    fn from(record: KeywordScheduleRecord) -> Self {
        KeywordSchedule {
            id: record.id,
            keyword_id: record.keyword_id,
            interval_hours: record.interval_hours,
            active: record.active,
            last_run_at: parse_datetime_opt(record.last_run_at),
            next_run_at: parse_datetime_opt(record.next_run_at),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Keyword schedule repository.
#[derive(Clone)]
pub struct ScheduleRepository {
    pool: DbPool,
}

impl ScheduleRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Active schedules whose cursor is unset or not after `now`.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<KeywordSchedule>, DbError> {
        let now = format_datetime(now);
        with_conn!(self.pool, conn => {
            keyword_schedules::table
                .filter(keyword_schedules::active.eq(true))
                .filter(
                    keyword_schedules::next_run_at
                        .is_null()
                        .or(keyword_schedules::next_run_at.le(&now)),
                )
                .order(keyword_schedules::id.asc())
                .load::<KeywordScheduleRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(KeywordSchedule::from).collect())
        })
    }

    /// Get a schedule by ID.
    pub async fn get(&self, id: i64) -> Result<Option<KeywordSchedule>, DbError> {
        with_conn!(self.pool, conn => {
            keyword_schedules::table
                .find(id)
                .first::<KeywordScheduleRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(KeywordSchedule::from))
        })
    }

    /// List all schedules.
    pub async fn list(&self) -> Result<Vec<KeywordSchedule>, DbError> {
        with_conn!(self.pool, conn => {
            keyword_schedules::table
                .order(keyword_schedules::id.asc())
                .load::<KeywordScheduleRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(KeywordSchedule::from).collect())
        })
    }

    /// The first schedule bound to a keyword, if any.
    pub async fn for_keyword(&self, keyword_id: i64) -> Result<Option<KeywordSchedule>, DbError> {
        with_conn!(self.pool, conn => {
            keyword_schedules::table
                .filter(keyword_schedules::keyword_id.eq(keyword_id))
                .order(keyword_schedules::id.asc())
                .first::<KeywordScheduleRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(KeywordSchedule::from))
        })
    }

    /// Create or update the schedule for a keyword.
    ///
    /// A new schedule first fires one interval after `now`. Updating an
    /// existing schedule re-arms its cursor only when it stays active.
    pub async fn upsert_for_keyword(
        &self,
        keyword_id: i64,
        interval_hours: i32,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<KeywordSchedule, DbError> {
        let interval_hours = clamp_interval_hours(interval_hours);
        let next_run_at = format_datetime(now + Duration::hours(i64::from(interval_hours)));
        let created_at = format_datetime(now);

        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    let existing = keyword_schedules::table
                        .filter(keyword_schedules::keyword_id.eq(keyword_id))
                        .order(keyword_schedules::id.asc())
                        .first::<KeywordScheduleRecord>(conn)
                        .await
                        .optional()?;

                    let id = match existing {
                        Some(record) => {
                            diesel::update(keyword_schedules::table.find(record.id))
                                .set((
                                    keyword_schedules::interval_hours.eq(interval_hours),
                                    keyword_schedules::active.eq(active),
                                ))
                                .execute(conn)
                                .await?;
                            if active {
                                diesel::update(keyword_schedules::table.find(record.id))
                                    .set(keyword_schedules::next_run_at.eq(&next_run_at))
                                    .execute(conn)
                                    .await?;
                            }
                            record.id
                        }
                        None => {
                            diesel::insert_into(keyword_schedules::table)
                                .values(NewKeywordSchedule {
                                    keyword_id,
                                    interval_hours,
                                    active,
                                    last_run_at: None,
                                    next_run_at: Some(&next_run_at),
                                    created_at: &created_at,
                                })
                                .execute(conn)
                                .await?;
                            let row: LastInsertRowId =
                                diesel::sql_query(LAST_INSERT_ROWID).get_result(conn).await?;
                            row.id
                        }
                    };

                    keyword_schedules::table
                        .find(id)
                        .first::<KeywordScheduleRecord>(conn)
                        .await
                        .map(KeywordSchedule::from)
                })
            })
            .await
        })
    }

    /// Persist the run cursor of a schedule.
    pub async fn save_cursor(&self, schedule: &KeywordSchedule) -> Result<bool, DbError> {
        let last_run_at = schedule.last_run_at.map(format_datetime);
        let next_run_at = schedule.next_run_at.map(format_datetime);
        with_conn!(self.pool, conn => {
            let rows = diesel::update(keyword_schedules::table.find(schedule.id))
                .set((
                    keyword_schedules::last_run_at.eq(last_run_at),
                    keyword_schedules::next_run_at.eq(next_run_at),
                ))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// Activate or pause a schedule without touching its cursor.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let rows = diesel::update(keyword_schedules::table.find(id))
                .set(keyword_schedules::active.eq(active))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KeywordSpec;
    use crate::repository::test_support::setup_test_db;
    use crate::repository::DbContext;

    async fn keyword_id(ctx: &DbContext) -> i64 {
        ctx.keywords()
            .get_or_create(&KeywordSpec::normalize("rust", "US", None, None).unwrap())
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_new_schedule_fires_after_one_interval() {
        let (ctx, _dir) = setup_test_db().await;
        let kid = keyword_id(&ctx).await;
        let now = Utc::now();

        let schedule = ctx
            .schedules()
            .upsert_for_keyword(kid, 6, true, now)
            .await
            .unwrap();
        assert_eq!(schedule.interval_hours, 6);
        assert!(schedule.last_run_at.is_none());
        assert_eq!(
            format_datetime(schedule.next_run_at.unwrap()),
            format_datetime(now + Duration::hours(6))
        );
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_and_clamps() {
        let (ctx, _dir) = setup_test_db().await;
        let kid = keyword_id(&ctx).await;
        let repo = ctx.schedules();
        let now = Utc::now();

        let first = repo.upsert_for_keyword(kid, 6, true, now).await.unwrap();
        let paused = repo
            .upsert_for_keyword(kid, 5000, false, now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(first.id, paused.id);
        assert_eq!(paused.interval_hours, 720);
        assert!(!paused.active);
        // Paused schedules keep their previous cursor
        assert_eq!(paused.next_run_at, first.next_run_at);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_due_boundaries() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.schedules();
        let now = Utc::now();

        let mut ids = Vec::new();
        for (name, offset) in [("null", None), ("future", Some(1)), ("past", Some(-1))] {
            let kid = ctx
                .keywords()
                .get_or_create(&KeywordSpec::normalize(name, "US", None, None).unwrap())
                .await
                .unwrap()
                .id;
            let mut schedule = repo.upsert_for_keyword(kid, 24, true, now).await.unwrap();
            schedule.next_run_at = offset.map(|secs| now + Duration::seconds(secs));
            repo.save_cursor(&schedule).await.unwrap();
            ids.push(schedule.id);
        }

        let due: Vec<i64> = repo.due(now).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(due, vec![ids[0], ids[2]]);
    }

    #[tokio::test]
    async fn test_inactive_schedule_is_never_due() {
        let (ctx, _dir) = setup_test_db().await;
        let kid = keyword_id(&ctx).await;
        let repo = ctx.schedules();
        let now = Utc::now();

        let mut schedule = repo.upsert_for_keyword(kid, 1, true, now).await.unwrap();
        schedule.next_run_at = None;
        repo.save_cursor(&schedule).await.unwrap();
        assert_eq!(repo.due(now).await.unwrap().len(), 1);

        repo.set_active(schedule.id, false).await.unwrap();
        assert!(repo.due(now).await.unwrap().is_empty());
    }
}
