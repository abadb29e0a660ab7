use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0004_tracked_sites")
        .depends_on(&["0003_scheduler_status"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE tracked_sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE tracked_hits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tracked_site_id INTEGER NOT NULL REFERENCES tracked_sites(id) ON DELETE CASCADE,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    keyword_id INTEGER NOT NULL REFERENCES keywords(id),
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    detected_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_tracked_hits_site ON tracked_hits(tracked_site_id)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_tracked_hits_run ON tracked_hits(run_id)",
        ))
}
