//! Keyword repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{KeywordRecord, NewKeyword};
use super::pool::{DbError, DbPool, SqliteConn};
use super::util::{LastInsertRowId, LAST_INSERT_ROWID};
use super::{format_datetime, parse_datetime};
use crate::models::{Keyword, KeywordSpec};
use crate::schema::keywords;
use crate::with_conn;

impl From<KeywordRecord> for Keyword {
    fn from(record: KeywordRecord) -> Self {
        Keyword {
            id: record.id,
            keyword: record.keyword,
            region: record.region,
            language: record.language,
            proxy_profile: record.proxy_profile,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Keyword repository.
#[derive(Clone)]
pub struct KeywordRepository {
    pool: DbPool,
}

impl KeywordRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a keyword by ID.
    pub async fn get(&self, id: i64) -> Result<Option<Keyword>, DbError> {
        with_conn!(self.pool, conn => {
            keywords::table
                .find(id)
                .first::<KeywordRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Keyword::from))
        })
    }

    /// List all keywords.
    pub async fn list(&self) -> Result<Vec<Keyword>, DbError> {
        with_conn!(self.pool, conn => {
            keywords::table
                .order(keywords::id.asc())
                .load::<KeywordRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(Keyword::from).collect())
        })
    }

    /// Find the keyword matching an identity tuple.
    pub async fn find(&self, spec: &KeywordSpec) -> Result<Option<Keyword>, DbError> {
        with_conn!(self.pool, conn => {
            find_by_spec(&mut conn, spec)
                .await
                .map(|opt| opt.map(Keyword::from))
        })
    }

    /// Resolve a keyword, creating it the first time the combination is seen.
    pub async fn get_or_create(&self, spec: &KeywordSpec) -> Result<Keyword, DbError> {
        with_conn!(self.pool, conn => {
            get_or_create_in(&mut conn, spec).await
        })
    }

    /// Resolve a batch of keyword entries in one transaction, preserving order.
    pub async fn sync(&self, specs: &[KeywordSpec]) -> Result<Vec<Keyword>, DbError> {
        let specs = specs.to_vec();
        with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    let mut resolved = Vec::with_capacity(specs.len());
                    for spec in &specs {
                        resolved.push(get_or_create_in(conn, spec).await?);
                    }
                    Ok(resolved)
                })
            })
            .await
        })
    }
}

async fn find_by_spec(
    conn: &mut SqliteConn,
    spec: &KeywordSpec,
) -> Result<Option<KeywordRecord>, DbError> {
    let mut query = keywords::table
        .filter(keywords::keyword.eq(&spec.keyword))
        .filter(keywords::region.eq(&spec.region))
        .filter(keywords::language.eq(&spec.language))
        .into_boxed();

    query = match spec.proxy_profile {
        Some(ref proxy) => query.filter(keywords::proxy_profile.eq(proxy)),
        None => query.filter(keywords::proxy_profile.is_null()),
    };

    query.first::<KeywordRecord>(conn).await.optional()
}

async fn get_or_create_in(conn: &mut SqliteConn, spec: &KeywordSpec) -> Result<Keyword, DbError> {
    if let Some(existing) = find_by_spec(conn, spec).await? {
        return Ok(Keyword::from(existing));
    }

    let now = Utc::now();
    let created_at = format_datetime(now);
    diesel::insert_into(keywords::table)
        .values(NewKeyword {
            keyword: &spec.keyword,
            region: &spec.region,
            language: &spec.language,
            proxy_profile: spec.proxy_profile.as_deref(),
            created_at: &created_at,
        })
        .execute(conn)
        .await?;
    let row: LastInsertRowId = diesel::sql_query(LAST_INSERT_ROWID).get_result(conn).await?;

    Ok(Keyword {
        id: row.id,
        keyword: spec.keyword.clone(),
        region: spec.region.clone(),
        language: spec.language.clone(),
        proxy_profile: spec.proxy_profile.clone(),
        created_at: parse_datetime(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;

    fn spec(keyword: &str, proxy: Option<&str>) -> KeywordSpec {
        KeywordSpec::normalize(keyword, "US", None, proxy).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.keywords();

        let first = repo.get_or_create(&spec("rust", None)).await.unwrap();
        let second = repo.get_or_create(&spec("rust", None)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_proxy_profile_is_part_of_identity() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.keywords();

        let direct = repo.get_or_create(&spec("rust", None)).await.unwrap();
        let proxied = repo.get_or_create(&spec("rust", Some("eu"))).await.unwrap();
        assert_ne!(direct.id, proxied.id);

        let found = repo.find(&spec("rust", Some("eu"))).await.unwrap().unwrap();
        assert_eq!(found.id, proxied.id);
    }

    #[tokio::test]
    async fn test_sync_preserves_order() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.keywords();

        let existing = repo.get_or_create(&spec("b", None)).await.unwrap();
        let synced = repo
            .sync(&[spec("a", None), spec("b", None), spec("c", None)])
            .await
            .unwrap();

        let names: Vec<_> = synced.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(synced[1].id, existing.id);
        assert!(repo.get(synced[2].id).await.unwrap().is_some());
    }
}
