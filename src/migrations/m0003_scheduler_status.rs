use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0003_scheduler_status")
        .depends_on(&["0002_keyword_schedules"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE scheduler_status (
    name TEXT PRIMARY KEY NOT NULL,
    running INTEGER NOT NULL DEFAULT 0,
    last_heartbeat TEXT,
    host TEXT,
    version TEXT,
    updated_at TEXT NOT NULL
)"#,
        ))
}
