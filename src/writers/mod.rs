pub mod csv_writer;
pub mod json_writer;
pub mod parquet_writer;

pub use csv_writer::CsvWriter;
pub use json_writer::JsonWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

use crate::analyzers::vibrancy::ScoredBuilding;
use crate::error::Result;
use crate::utils::filename::ExportFormat;
use std::path::Path;

/// Write scores in the requested format, creating parent directories as needed.
/// `parquet` carries the compression and row-group settings for Parquet output.
pub fn export_scores(
    scores: &[ScoredBuilding],
    format: ExportFormat,
    path: &Path,
    parquet: &ParquetWriter,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Parquet => parquet.write_scores(scores, path),
        ExportFormat::Csv => CsvWriter::new().write_scores(scores, path),
        ExportFormat::Json => JsonWriter::new().write_scores(scores, path),
    }
}
