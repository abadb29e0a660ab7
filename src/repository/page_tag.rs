//! Page tag and watch URL repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{NewPageTag, NewWatchUrl, PageTagRecord, WatchUrlRecord};
use super::pool::{DbError, DbPool, SqliteConn};
use super::util::{from_json_column, to_json_column, LastInsertRowId, LAST_INSERT_ROWID};
use super::{format_datetime, parse_datetime};
use crate::models::{HreflangMap, PageTag, TagPayload, WatchUrl, DEFAULT_WATCH_REGION};
use crate::schema::{page_tags, watch_urls};
use crate::with_conn;

impl From<WatchUrlRecord> for WatchUrl {
    fn from(record: WatchUrlRecord) -> Self {
        WatchUrl {
            id: record.id,
            url: record.url,
            region: record.region,
            proxy_profile: record.proxy_profile,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

impl TryFrom<PageTagRecord> for PageTag {
    type Error = diesel::result::Error;

    fn try_from(record: PageTagRecord) -> Result<Self, Self::Error> {
        let hreflang = record
            .hreflang
            .as_deref()
            .map(from_json_column::<HreflangMap>)
            .transpose()?;

        Ok(PageTag {
            id: record.id,
            run_id: record.run_id,
            watch_url_id: record.watch_url_id,
            canonical: record.canonical,
            hreflang,
            raw: from_json_column(&record.raw)?,
            created_at: parse_datetime(&record.created_at),
        })
    }
}

/// One tag check to persist.
#[derive(Debug, Clone)]
pub struct NewTagCheck<'a> {
    pub run_id: i64,
    pub url: &'a str,
    /// Region for a newly created watch URL; defaults to `US`.
    pub region: Option<&'a str>,
    pub proxy_profile: Option<&'a str>,
    pub canonical: Option<&'a str>,
    pub hreflang: Option<&'a HreflangMap>,
    pub raw: &'a TagPayload,
}

/// Page tag repository.
#[derive(Clone)]
pub struct PageTagRepository {
    pool: DbPool,
}

impl PageTagRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resolve or create the watch URL and insert the tag record atomically.
    pub async fn record(&self, check: NewTagCheck<'_>, now: DateTime<Utc>) -> Result<PageTag, DbError> {
        let created_at = format_datetime(now);
        let hreflang = check.hreflang.map(to_json_column).transpose()?;
        let raw = to_json_column(check.raw)?;

        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    let watch_url = get_or_create_watch_url(
                        conn,
                        check.url,
                        check.region,
                        check.proxy_profile,
                        &created_at,
                    )
                    .await?;

                    diesel::insert_into(page_tags::table)
                        .values(NewPageTag {
                            run_id: check.run_id,
                            watch_url_id: watch_url.id,
                            canonical: check.canonical,
                            hreflang: hreflang.as_deref(),
                            raw: &raw,
                            created_at: &created_at,
                        })
                        .execute(conn)
                        .await?;
                    let row: LastInsertRowId =
                        diesel::sql_query(LAST_INSERT_ROWID).get_result(conn).await?;

                    page_tags::table
                        .find(row.id)
                        .first::<PageTagRecord>(conn)
                        .await
                        .and_then(PageTag::try_from)
                })
            })
            .await
        })
    }

    /// Whether a tag record exists for this run and URL.
    pub async fn exists_for(&self, run_id: i64, url: &str) -> Result<bool, DbError> {
        with_conn!(self.pool, conn => {
            let count: i64 = page_tags::table
                .inner_join(watch_urls::table)
                .filter(page_tags::run_id.eq(run_id))
                .filter(watch_urls::url.eq(url))
                .count()
                .get_result(&mut conn)
                .await?;
            Ok(count > 0)
        })
    }

    /// The newest tag record for this run and URL.
    pub async fn latest_for(&self, run_id: i64, url: &str) -> Result<Option<PageTag>, DbError> {
        with_conn!(self.pool, conn => {
            page_tags::table
                .inner_join(watch_urls::table)
                .filter(page_tags::run_id.eq(run_id))
                .filter(watch_urls::url.eq(url))
                .order(page_tags::id.desc())
                .select(PageTagRecord::as_select())
                .first::<PageTagRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(PageTag::try_from).transpose())
        })
    }

    /// All tag records of a run with their URLs, in insertion order.
    pub async fn for_run(&self, run_id: i64) -> Result<Vec<(String, PageTag)>, DbError> {
        with_conn!(self.pool, conn => {
            let rows = page_tags::table
                .inner_join(watch_urls::table)
                .filter(page_tags::run_id.eq(run_id))
                .order(page_tags::id.asc())
                .select((watch_urls::url, PageTagRecord::as_select()))
                .load::<(String, PageTagRecord)>(&mut conn)
                .await?;

            rows.into_iter()
                .map(|(url, record)| PageTag::try_from(record).map(|tag| (url, tag)))
                .collect()
        })
    }

    /// Look up a watch URL.
    pub async fn watch_url(&self, url: &str) -> Result<Option<WatchUrl>, DbError> {
        with_conn!(self.pool, conn => {
            watch_urls::table
                .filter(watch_urls::url.eq(url))
                .first::<WatchUrlRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(WatchUrl::from))
        })
    }
}

async fn get_or_create_watch_url(
    conn: &mut SqliteConn,
    url: &str,
    region: Option<&str>,
    proxy_profile: Option<&str>,
    created_at: &str,
) -> Result<WatchUrlRecord, DbError> {
    let existing = watch_urls::table
        .filter(watch_urls::url.eq(url))
        .first::<WatchUrlRecord>(conn)
        .await
        .optional()?;
    if let Some(record) = existing {
        return Ok(record);
    }

    diesel::insert_into(watch_urls::table)
        .values(NewWatchUrl {
            url,
            region: region.unwrap_or(DEFAULT_WATCH_REGION),
            proxy_profile,
            created_at,
        })
        .execute(conn)
        .await?;

    watch_urls::table
        .filter(watch_urls::url.eq(url))
        .first::<WatchUrlRecord>(conn)
        .await
}
