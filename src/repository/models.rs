//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Keyword record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::keywords)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KeywordRecord {
    pub id: i64,
    pub keyword: String,
    pub region: String,
    pub language: String,
    pub proxy_profile: Option<String>,
    pub created_at: String,
}

/// New keyword for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::keywords)]
pub struct NewKeyword<'a> {
    pub keyword: &'a str,
    pub region: &'a str,
    pub language: &'a str,
    pub proxy_profile: Option<&'a str>,
    pub created_at: &'a str,
}

/// Keyword schedule record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::keyword_schedules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KeywordScheduleRecord {
    pub id: i64,
    pub keyword_id: i64,
    pub interval_hours: i32,
    pub active: bool,
    pub last_run_at: Option<String>,
    pub next_run_at: Option<String>,
    pub created_at: String,
}

/// New keyword schedule for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::keyword_schedules)]
pub struct NewKeywordSchedule<'a> {
    pub keyword_id: i64,
    pub interval_hours: i32,
    pub active: bool,
    pub last_run_at: Option<&'a str>,
    pub next_run_at: Option<&'a str>,
    pub created_at: &'a str,
}

/// Run record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RunRecord {
    pub id: i64,
    pub kind: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub error: Option<String>,
}

/// New run for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::runs)]
pub struct NewRun<'a> {
    pub kind: &'a str,
    pub status: &'a str,
    pub started_at: &'a str,
}

/// SERP result record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::serp_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SerpResultRecord {
    pub id: i64,
    pub run_id: i64,
    pub keyword_id: i64,
    pub position: i32,
    pub title: Option<String>,
    pub link: String,
    pub snippet: Option<String>,
    pub raw: String,
    pub created_at: String,
}

/// New SERP result for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::serp_results)]
pub struct NewSerpResult<'a> {
    pub run_id: i64,
    pub keyword_id: i64,
    pub position: i32,
    pub title: Option<&'a str>,
    pub link: &'a str,
    pub snippet: Option<&'a str>,
    pub raw: &'a str,
    pub created_at: &'a str,
}

/// Tracked site record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::tracked_sites)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TrackedSiteRecord {
    pub id: i64,
    pub domain: String,
    pub created_at: String,
}

/// New tracked site for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::tracked_sites)]
pub struct NewTrackedSite<'a> {
    pub domain: &'a str,
    pub created_at: &'a str,
}

/// Tracked hit record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::tracked_hits)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TrackedHitRecord {
    pub id: i64,
    pub tracked_site_id: i64,
    pub run_id: i64,
    pub keyword_id: i64,
    pub position: i32,
    pub url: String,
    pub detected_at: String,
}

/// New tracked hit for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::tracked_hits)]
pub struct NewTrackedHit<'a> {
    pub tracked_site_id: i64,
    pub run_id: i64,
    pub keyword_id: i64,
    pub position: i32,
    pub url: &'a str,
    pub detected_at: &'a str,
}

/// Watch URL record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::watch_urls)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WatchUrlRecord {
    pub id: i64,
    pub url: String,
    pub region: String,
    pub proxy_profile: Option<String>,
    pub created_at: String,
}

/// New watch URL for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::watch_urls)]
pub struct NewWatchUrl<'a> {
    pub url: &'a str,
    pub region: &'a str,
    pub proxy_profile: Option<&'a str>,
    pub created_at: &'a str,
}

/// Page tag record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::page_tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PageTagRecord {
    pub id: i64,
    pub run_id: i64,
    pub watch_url_id: i64,
    pub canonical: Option<String>,
    pub hreflang: Option<String>,
    pub raw: String,
    pub created_at: String,
}

/// New page tag for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::page_tags)]
pub struct NewPageTag<'a> {
    pub run_id: i64,
    pub watch_url_id: i64,
    pub canonical: Option<&'a str>,
    pub hreflang: Option<&'a str>,
    pub raw: &'a str,
    pub created_at: &'a str,
}

/// Scheduler status record from the database.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::scheduler_status)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SchedulerStatusRecord {
    pub name: String,
    pub running: bool,
    pub last_heartbeat: Option<String>,
    pub host: Option<String>,
    pub version: Option<String>,
    pub updated_at: String,
}
