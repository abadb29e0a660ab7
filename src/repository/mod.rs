//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM against SQLite. Timestamps are stored
//! as fixed-width RFC 3339 UTC text so that string comparison orders them.

pub mod context;
pub mod keyword;
pub mod migrations;
pub mod models;
pub mod page_tag;
pub mod pool;
pub mod run;
pub mod schedule;
pub mod scheduler_status;
pub mod serp_result;
pub mod tracked;
pub mod util;

pub use context::DbContext;
pub use keyword::KeywordRepository;
pub use page_tag::{NewTagCheck, PageTagRepository};
pub use pool::{DbError, DbPool};
pub use run::RunRepository;
pub use schedule::ScheduleRepository;
pub use scheduler_status::SchedulerStatusRepository;
pub use serp_result::{RecordedResults, SerpResultRepository};
pub use tracked::TrackedSiteRepository;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp for storage.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
