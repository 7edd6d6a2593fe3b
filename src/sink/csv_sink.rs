//! CSV spreadsheet sink
//!
//! Writes one header row when the file is created and appends each batch
//! after it. The file opens directly in any spreadsheet application.

use crate::pipeline::ResultRecord;
use crate::sink::traits::{PersistenceSink, SinkResult};
use crate::sink::{record_cells, COLUMN_HEADERS};
use std::fs::File;
use std::path::Path;

/// CSV-backed result sink
pub struct CsvSink {
    writer: csv::Writer<File>,
    rows_written: u64,
}

impl CsvSink {
    /// Creates the file and writes the header row
    pub fn create(path: &Path) -> SinkResult<Self> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(COLUMN_HEADERS)?;
        writer.flush()?;

        tracing::debug!("Created CSV output {}", path.display());

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Number of data rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

impl PersistenceSink for CsvSink {
    fn append_batch(&mut self, records: &[ResultRecord]) -> SinkResult<()> {
        for record in records {
            self.writer.write_record(record_cells(record))?;
        }
        // Each batch is durable once append_batch returns
        self.writer.flush()?;
        self.rows_written += records.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
