//! Persistence sinks for result batches
//!
//! This module handles:
//! - The `PersistenceSink` trait the result buffer flushes into
//! - A CSV spreadsheet sink (the default output)
//! - A SQLite sink for results that should be queried afterwards
//! - Choosing and opening a sink from the output path

mod csv_sink;
mod schema;
mod sqlite_sink;
mod traits;

pub use csv_sink::CsvSink;
pub use sqlite_sink::SqliteSink;
pub use traits::{PersistenceSink, SinkError, SinkResult};

use crate::pipeline::ResultRecord;
use crate::CrawlsheetError;
use std::path::Path;

/// Column titles shared by every sink, in output order
pub const COLUMN_HEADERS: [&str; 18] = [
    "Url",
    "Referer",
    "Status",
    "Time (ms)",
    "Size (bytes)",
    "ContentType",
    "Charset",
    "Lang",
    "SeoTitle",
    "SeoDescription",
    "SeoKeywords",
    "OgTitle",
    "OgDescription",
    "OgType",
    "OgUrl",
    "OgImage",
    "OgSiteName",
    "Error",
];

/// Output format selected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Sqlite,
}

impl OutputFormat {
    /// `.db`, `.sqlite` and `.sqlite3` select SQLite; everything else is CSV
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("db" | "sqlite" | "sqlite3") => Self::Sqlite,
            _ => Self::Csv,
        }
    }
}

/// Opens the sink for an output path
///
/// # Arguments
///
/// * `path` - Output file; its extension selects the format
/// * `overwrite` - Replace the file if it already exists
/// * `config_hash` - Recorded with the run by sinks that keep run metadata
///
/// # Returns
///
/// * `Ok(Box<dyn PersistenceSink>)` - A sink ready for the first batch
/// * `Err(CrawlsheetError::OutputExists)` - The file exists and `overwrite` is false
/// * `Err(CrawlsheetError::Sink)` - The file could not be created
pub fn open_sink(
    path: &Path,
    overwrite: bool,
    config_hash: &str,
) -> Result<Box<dyn PersistenceSink>, CrawlsheetError> {
    if path.exists() {
        if !overwrite {
            return Err(CrawlsheetError::OutputExists {
                path: path.to_path_buf(),
            });
        }
        tracing::info!("Replacing existing output {}", path.display());
        std::fs::remove_file(path)?;
    }

    let sink: Box<dyn PersistenceSink> = match OutputFormat::from_path(path) {
        OutputFormat::Csv => Box::new(CsvSink::create(path)?),
        OutputFormat::Sqlite => Box::new(SqliteSink::create(path, config_hash)?),
    };

    Ok(sink)
}

/// Flattens a record into the cells of one output row
pub fn record_cells(record: &ResultRecord) -> [String; 18] {
    fn text(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }

    [
        record.url.clone(),
        text(&record.referer),
        record.http_status.to_string(),
        record.elapsed_millis.to_string(),
        record.size_bytes.to_string(),
        text(&record.page_info.content_type),
        text(&record.page_info.charset),
        text(&record.page_info.lang),
        text(&record.seo_info.title),
        text(&record.seo_info.description),
        text(&record.seo_info.keywords),
        text(&record.open_graph_info.title),
        text(&record.open_graph_info.description),
        text(&record.open_graph_info.og_type),
        text(&record.open_graph_info.url),
        text(&record.open_graph_info.image),
        text(&record.open_graph_info.site_name),
        record.error_text.clone(),
    ]
}
