//! Migration Schema Tests
//!
//! Verifies that the cetane migrations produce the tables and constraints the
//! diesel schema expects.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{Connection, Result as SqliteResult};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnInfo {
    col_type: String,
    not_null: bool,
    primary_key: bool,
}

/// Extract table columns from a SQLite connection
fn extract_tables(conn: &Connection) -> SqliteResult<BTreeMap<String, BTreeMap<String, ColumnInfo>>> {
    let mut tables = BTreeMap::new();

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let table_names: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<SqliteResult<Vec<_>>>()?;

    for table_name in table_names {
        let mut pragma = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table_name))?;
        let columns = pragma
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(1)?,
                    ColumnInfo {
                        col_type: row.get::<_, String>(2)?.to_uppercase(),
                        not_null: row.get(3)?,
                        primary_key: row.get::<_, i32>(5)? > 0,
                    },
                ))
            })?
            .collect::<SqliteResult<BTreeMap<_, _>>>()?;
        tables.insert(table_name, columns);
    }

    Ok(tables)
}

fn extract_indexes(conn: &Connection) -> SqliteResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='index' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<SqliteResult<BTreeSet<String>>>()?;
    Ok(names)
}

/// Run cetane migrations (generates SQL for SQLite backend)
fn run_cetane_migrations(conn: &Connection) -> SqliteResult<()> {
    use cetane::backend::Sqlite;

    let registry = serpwatch::migrations::registry();
    let backend = Sqlite;

    let ordered_names = registry
        .resolve_order()
        .expect("Failed to resolve migration order");

    for name in ordered_names {
        let migration = registry
            .get(name)
            .expect("Migration not found after resolve");
        for stmt in migration.forward_sql(&backend) {
            if stmt.trim().is_empty() {
                continue;
            }
            conn.execute_batch(&stmt)?;
        }
    }

    Ok(())
}

fn migrated() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory db");
    run_cetane_migrations(&conn).expect("Failed to run cetane migrations");
    conn
}

#[test]
fn test_tables_match_diesel_schema() {
    let conn = migrated();
    let tables = extract_tables(&conn).unwrap();

    let expected: &[(&str, &[&str])] = &[
        ("keywords", &["id", "keyword", "region", "language", "proxy_profile", "created_at"]),
        (
            "keyword_schedules",
            &["id", "keyword_id", "interval_hours", "active", "last_run_at", "next_run_at", "created_at"],
        ),
        ("runs", &["id", "kind", "status", "started_at", "finished_at", "error"]),
        (
            "serp_results",
            &["id", "run_id", "keyword_id", "position", "title", "link", "snippet", "raw", "created_at"],
        ),
        ("tracked_sites", &["id", "domain", "created_at"]),
        (
            "tracked_hits",
            &["id", "tracked_site_id", "run_id", "keyword_id", "position", "url", "detected_at"],
        ),
        ("watch_urls", &["id", "url", "region", "proxy_profile", "created_at"]),
        (
            "page_tags",
            &["id", "run_id", "watch_url_id", "canonical", "hreflang", "raw", "created_at"],
        ),
        (
            "scheduler_status",
            &["name", "running", "last_heartbeat", "host", "version", "updated_at"],
        ),
    ];

    let mut diffs = Vec::new();
    for (table, columns) in expected {
        let Some(actual) = tables.get(*table) else {
            diffs.push(format!("Missing table: {}", table));
            continue;
        };
        let actual_names: BTreeSet<&str> = actual.keys().map(String::as_str).collect();
        let expected_names: BTreeSet<&str> = columns.iter().copied().collect();
        if actual_names != expected_names {
            diffs.push(format!(
                "Column mismatch in {}: expected {:?}, got {:?}",
                table, expected_names, actual_names
            ));
        }
    }
    assert!(diffs.is_empty(), "Schema differences:\n{}", diffs.join("\n"));
    assert_eq!(tables.len(), expected.len());
}

#[test]
fn test_nullability_of_key_columns() {
    let conn = migrated();
    let tables = extract_tables(&conn).unwrap();

    let keywords = &tables["keywords"];
    assert!(keywords["id"].primary_key);
    assert!(keywords["keyword"].not_null);
    assert!(!keywords["proxy_profile"].not_null);

    let status = &tables["scheduler_status"];
    assert!(status["name"].primary_key);
    assert_eq!(status["name"].col_type, "TEXT");

    let tags = &tables["page_tags"];
    assert!(!tags["canonical"].not_null);
    assert!(!tags["hreflang"].not_null);
    assert!(tags["raw"].not_null);
}

#[test]
fn test_expected_indexes_exist() {
    let conn = migrated();
    let indexes = extract_indexes(&conn).unwrap();

    for name in [
        "idx_keywords_identity",
        "idx_runs_kind_started",
        "idx_serp_results_run",
        "idx_keyword_schedules_due",
        "idx_tracked_hits_site",
        "idx_page_tags_run_watch",
    ] {
        assert!(indexes.contains(name), "Missing index: {}", name);
    }
}

#[test]
fn test_keyword_identity_is_unique_without_proxy() {
    let conn = migrated();
    let insert = "INSERT INTO keywords (keyword, region, language, proxy_profile, created_at)
                  VALUES (?1, 'US', 'EN', ?2, '2025-01-01T00:00:00.000000Z')";

    conn.execute(insert, rusqlite::params!["shoes", None::<String>])
        .unwrap();
    assert!(conn
        .execute(insert, rusqlite::params!["shoes", None::<String>])
        .is_err());

    // A distinct proxy profile is a distinct identity
    conn.execute(insert, rusqlite::params!["shoes", Some("mobile")])
        .unwrap();
}

#[test]
fn test_tracked_domain_is_unique() {
    let conn = migrated();
    let insert = "INSERT INTO tracked_sites (domain, created_at) VALUES ('a.com', '2025-01-01T00:00:00.000000Z')";
    conn.execute(insert, []).unwrap();
    assert!(conn.execute(insert, []).is_err());
}
