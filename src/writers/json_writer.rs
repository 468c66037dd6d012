use crate::analyzers::vibrancy::ScoredBuilding;
use crate::error::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pretty-printed JSON output
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl JsonWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_scores(&self, scores: &[ScoredBuilding], path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_value(&scores, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize any report to a writer, used for `--json` command output
    pub fn write_value<T: Serialize + ?Sized, W: Write>(&self, value: &T, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    }
}
