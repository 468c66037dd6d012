use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Export format for scored buildings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Parquet,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Parquet => "parquet",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Default export path: output/vibrancy-{YYMMDD}.{ext}
pub fn generate_default_export_filename(format: ExportFormat) -> PathBuf {
    let now = Local::now();
    let filename = format!(
        "vibrancy-{:02}{:02}{:02}.{}",
        now.year() % 100,
        now.month(),
        now.day(),
        format.extension()
    );
    PathBuf::from("output").join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_filename() {
        let filename = generate_default_export_filename(ExportFormat::Parquet);
        let filename_str = filename.to_string_lossy();

        let parts: Vec<&str> = filename_str.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "output");
        assert!(parts[1].starts_with("vibrancy-"));
        assert!(parts[1].ends_with(".parquet"));
        // vibrancy-YYMMDD.parquet
        assert_eq!(parts[1].len(), 23);
    }

    #[test]
    fn test_extension_per_format() {
        let csv = generate_default_export_filename(ExportFormat::Csv);
        assert_eq!(csv.extension().and_then(|e| e.to_str()), Some("csv"));
        assert_eq!(ExportFormat::Json.extension(), "json");
    }
}
