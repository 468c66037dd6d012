//! Layered runtime settings.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file
//! (`--config <path>` or `footfall.toml` in the working directory when present),
//! then `FOOTFALL_*` environment variables. Nested keys use `__`, e.g.
//! `FOOTFALL_WEIGHTS__TRAFFIC=0.5`.

use crate::analyzers::vibrancy::VibrancyWeights;
use crate::error::Result;
use crate::readers::ColumnLayout;
use crate::utils::constants::{
    COMPRESSION_SNAPPY, DEFAULT_CONFIG_FILE, DEFAULT_ROW_GROUP_SIZE, DEFAULT_WEEKDAY_TOLERANCE,
    DWELL_WEIGHT, ENV_PREFIX, SPREAD_WEIGHT, TRAFFIC_WEIGHT,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(custom(function = "validate_weights"))]
    pub weights: VibrancyWeights,

    #[validate(range(min = 0.0, max = 100.0))]
    pub weekday_tolerance: f64,

    pub layout: ColumnLayout,

    #[validate(range(min = 1))]
    pub max_workers: usize,

    pub compression: String,

    #[validate(range(min = 1))]
    pub row_group_size: usize,

    /// Visit dataset used when a command is given no `--input`
    pub input: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weights: VibrancyWeights::default(),
            weekday_tolerance: DEFAULT_WEEKDAY_TOLERANCE,
            layout: ColumnLayout::default(),
            max_workers: num_cpus::get(),
            compression: COMPRESSION_SNAPPY.to_string(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            input: None,
        }
    }
}

impl Settings {
    /// Load settings; an explicit `path` must exist, the default file is optional
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("weights.traffic", TRAFFIC_WEIGHT)?
            .set_default("weights.dwell", DWELL_WEIGHT)?
            .set_default("weights.spread", SPREAD_WEIGHT)?
            .set_default("weekday_tolerance", DEFAULT_WEEKDAY_TOLERANCE)?
            .set_default("layout", "header")?
            .set_default("max_workers", num_cpus::get() as i64)?
            .set_default("compression", COMPRESSION_SNAPPY)?
            .set_default("row_group_size", DEFAULT_ROW_GROUP_SIZE as i64)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }
}

fn validate_weights(weights: &VibrancyWeights) -> std::result::Result<(), ValidationError> {
    if weights.is_valid() {
        Ok(())
    } else {
        let mut error = ValidationError::new("weights");
        error.message = Some("weights must be non-negative and sum to 1".into());
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_overrides_defaults() -> Result<()> {
        let file = toml_file(
            r#"
            layout = "positional"
            weekday_tolerance = 2.5
            input = "data/visits.csv"

            [weights]
            traffic = 0.5
            dwell = 0.25
            spread = 0.25
            "#,
        );

        let settings = Settings::load(Some(file.path()))?;
        assert_eq!(settings.layout, ColumnLayout::Positional);
        assert_eq!(settings.weekday_tolerance, 2.5);
        assert_eq!(settings.weights.traffic, 0.5);
        assert_eq!(settings.compression, COMPRESSION_SNAPPY);
        assert_eq!(settings.row_group_size, DEFAULT_ROW_GROUP_SIZE);
        assert_eq!(settings.input, Some(PathBuf::from("data/visits.csv")));

        Ok(())
    }

    #[test]
    fn test_rejects_unbalanced_weights() {
        let file = toml_file("[weights]\ntraffic = 0.9\ndwell = 0.3\nspread = 0.3\n");

        let result = Settings::load(Some(file.path()));
        assert!(matches!(result, Err(AnalyticsError::Validation(_))));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let result = Settings::load(Some(Path::new("/nonexistent/footfall.toml")));
        assert!(matches!(result, Err(AnalyticsError::Settings(_))));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }
}
