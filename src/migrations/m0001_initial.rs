use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_initial_schema")
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL,
    region TEXT NOT NULL,
    language TEXT NOT NULL DEFAULT 'EN',
    proxy_profile TEXT,
    created_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            // NULL proxy profiles compare equal through IFNULL so the identity key stays unique
            "CREATE UNIQUE INDEX idx_keywords_identity ON keywords(keyword, region, language, IFNULL(proxy_profile, ''))",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    started_at TEXT NOT NULL,
    finished_at TEXT,
    error TEXT
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_runs_kind_started ON runs(kind, started_at)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE serp_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    keyword_id INTEGER NOT NULL REFERENCES keywords(id),
    position INTEGER NOT NULL,
    title TEXT,
    link TEXT NOT NULL,
    snippet TEXT,
    raw TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_serp_results_run ON serp_results(run_id, position)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_serp_results_keyword ON serp_results(keyword_id)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE watch_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    region TEXT NOT NULL DEFAULT 'US',
    proxy_profile TEXT,
    created_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE page_tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    watch_url_id INTEGER NOT NULL REFERENCES watch_urls(id),
    canonical TEXT,
    hreflang TEXT,
    raw TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_page_tags_run_watch ON page_tags(run_id, watch_url_id)",
        ))
}
