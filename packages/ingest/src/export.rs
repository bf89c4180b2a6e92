//! File export of normalized records.
//!
//! Both formats use the external column names, so an export lines up with
//! the database table column for column.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nba_stats_models::{PlayerStatRecord, StatField};

/// Errors that can occur while writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Creating or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Header row plus one line per record; missing values are empty.
    #[default]
    Csv,
    /// Pretty-printed array of objects; missing values are `null`.
    Json,
}

/// Writes `records` to `writer`.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the writer fails.
pub fn write_records<W: Write>(
    mut writer: W,
    format: ExportFormat,
    records: &[PlayerStatRecord],
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => {
            // Header written by hand so an empty export still has one.
            let mut csv = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer);
            csv.write_record(StatField::all().iter().map(|f| f.column_name()))?;
            for record in records {
                csv.serialize(record)?;
            }
            csv.flush()?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Writes `records` to a new file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`ExportError`] if the file can't be created or written.
pub fn export_records(
    path: &Path,
    format: ExportFormat,
    records: &[PlayerStatRecord],
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_records(BufWriter::new(file), format, records)?;
    log::info!(
        "Wrote {} records to {} ({format:?})",
        records.len(),
        path.display()
    );
    Ok(())
}
