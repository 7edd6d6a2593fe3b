//! Database schema for the SQLite sink

/// SQL schema for result databases
pub const SCHEMA_SQL: &str = r#"
-- Track export runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per result record, in flush order
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    referer TEXT,
    status INTEGER NOT NULL,
    time_ms INTEGER NOT NULL,
    size_bytes INTEGER NOT NULL,
    content_type TEXT,
    charset TEXT,
    lang TEXT,
    seo_title TEXT,
    seo_description TEXT,
    seo_keywords TEXT,
    og_title TEXT,
    og_description TEXT,
    og_type TEXT,
    og_url TEXT,
    og_image TEXT,
    og_site_name TEXT,
    error TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_results_run ON results(run_id);
CREATE INDEX IF NOT EXISTS idx_results_status ON results(status);
"#;

/// Creates the tables if they do not exist yet
///
/// # Arguments
///
/// * `conn` - Open database connection
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
