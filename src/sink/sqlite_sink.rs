//! SQLite result sink
//!
//! Each sink instance opens one run row, appends every batch inside a
//! transaction tagged with that run, and marks the run completed on finish.

use crate::pipeline::ResultRecord;
use crate::sink::schema::initialize_schema;
use crate::sink::traits::{PersistenceSink, SinkResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// Status of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    /// Converts to the database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
        }
    }
}

/// SQLite-backed result sink
pub struct SqliteSink {
    conn: Connection,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database and starts a run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration used for this run
    pub fn create(path: &Path, config_hash: &str) -> SinkResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        Self::with_connection(conn, config_hash)
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(config_hash: &str) -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn, config_hash)
    }

    fn with_connection(conn: Connection, config_hash: &str) -> SinkResult<Self> {
        initialize_schema(&conn)?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        let run_id = conn.last_insert_rowid();

        tracing::debug!("Started SQLite run {}", run_id);

        Ok(Self { conn, run_id })
    }

    /// Identifier of the run this sink writes to
    pub fn run_id(&self) -> i64 {
        self.run_id
    }
}

impl PersistenceSink for SqliteSink {
    fn append_batch(&mut self, records: &[ResultRecord]) -> SinkResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO results (
                    run_id, url, referer, status, time_ms, size_bytes, content_type,
                    charset, lang, seo_title, seo_description, seo_keywords,
                    og_title, og_description, og_type, og_url, og_image, og_site_name, error
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            )?;

            for record in records {
                stmt.execute(params![
                    self.run_id,
                    record.url,
                    record.referer,
                    record.http_status,
                    record.elapsed_millis as i64,
                    record.size_bytes as i64,
                    record.page_info.content_type,
                    record.page_info.charset,
                    record.page_info.lang,
                    record.seo_info.title,
                    record.seo_info.description,
                    record.seo_info.keywords,
                    record.open_graph_info.title,
                    record.open_graph_info.description,
                    record.open_graph_info.og_type,
                    record.open_graph_info.url,
                    record.open_graph_info.image,
                    record.open_graph_info.site_name,
                    record.error_text,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2 WHERE id = ?3",
            params![now, RunStatus::Completed.to_db_string(), self.run_id],
        )?;
        tracing::debug!("Completed SQLite run {}", self.run_id);
        Ok(())
    }
}
