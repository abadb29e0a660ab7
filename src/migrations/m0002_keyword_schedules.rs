use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_keyword_schedules")
        .depends_on(&["0001_initial_schema"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE keyword_schedules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword_id INTEGER NOT NULL REFERENCES keywords(id) ON DELETE CASCADE,
    interval_hours INTEGER NOT NULL CHECK (interval_hours >= 1),
    active INTEGER NOT NULL DEFAULT 1,
    last_run_at TEXT,
    next_run_at TEXT,
    created_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_keyword_schedules_keyword ON keyword_schedules(keyword_id)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_keyword_schedules_due ON keyword_schedules(active, next_run_at)",
        ))
}
