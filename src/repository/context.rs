//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the connection pool and provides access to all repositories.

use std::path::Path;

use super::keyword::KeywordRepository;
use super::page_tag::PageTagRepository;
use super::pool::{DbError, DbPool};
use super::run::RunRepository;
use super::schedule::ScheduleRepository;
use super::scheduler_status::SchedulerStatusRepository;
use super::serp_result::SerpResultRepository;
use super::tracked::TrackedSiteRepository;

/// Database context that manages the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:serpwatch.db");
/// ctx.init_schema().await?;
/// let due = ctx.schedules().due(Utc::now()).await?;
/// ```
#[derive(Clone, Debug)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
        }
    }

    /// Create a context from a database URL (`sqlite:` prefix optional).
    pub fn from_url(url: &str) -> Self {
        Self {
            pool: DbPool::new(url),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get a keyword repository.
    pub fn keywords(&self) -> KeywordRepository {
        KeywordRepository::new(self.pool.clone())
    }

    /// Get a schedule repository.
    pub fn schedules(&self) -> ScheduleRepository {
        ScheduleRepository::new(self.pool.clone())
    }

    /// Get a run repository.
    pub fn runs(&self) -> RunRepository {
        RunRepository::new(self.pool.clone())
    }

    /// Get a SERP result repository.
    pub fn results(&self) -> SerpResultRepository {
        SerpResultRepository::new(self.pool.clone())
    }

    /// Get a tracked site repository.
    pub fn tracked_sites(&self) -> TrackedSiteRepository {
        TrackedSiteRepository::new(self.pool.clone())
    }

    /// Get a page tag repository.
    pub fn page_tags(&self) -> PageTagRepository {
        PageTagRepository::new(self.pool.clone())
    }

    /// Get a scheduler status repository.
    pub fn scheduler_status(&self) -> SchedulerStatusRepository {
        SchedulerStatusRepository::new(self.pool.clone())
    }

    /// Bring the schema up to date.
    pub async fn init_schema(&self) -> Result<Vec<String>, DbError> {
        super::migrations::run_migrations(self.pool.database_url()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::QueryableByName;
    use diesel_async::RunQueryDsl;
    use tempfile::tempdir;

    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[tokio::test]
    async fn test_init_schema_creates_tables() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        let mut conn = ctx.pool().get().await.unwrap();
        let tables: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .load(&mut conn)
        .await
        .unwrap();
        let names: Vec<_> = tables.into_iter().map(|t| t.name).collect();

        for expected in [
            "keyword_schedules",
            "keywords",
            "page_tags",
            "runs",
            "scheduler_status",
            "serp_results",
            "tracked_hits",
            "tracked_sites",
            "watch_urls",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing table {expected}");
        }
    }
}
