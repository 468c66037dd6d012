use crate::analyzers::vibrancy::ScoredBuilding;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Flat CSV row for a scored building
#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    id: &'a str,
    name: &'a str,
    region_code: Option<&'a str>,
    start_date: Option<NaiveDate>,
    foottraffic: Option<i64>,
    vibrancy: u8,
    traffic_score: u8,
    dwell_score: u8,
    spread_score: u8,
}

impl<'a> From<&'a ScoredBuilding> for ScoreRow<'a> {
    fn from(scored: &'a ScoredBuilding) -> Self {
        let components = scored.vibrancy.components;
        Self {
            id: &scored.id,
            name: &scored.name,
            region_code: scored.region_code.as_deref(),
            start_date: scored.start_date,
            foottraffic: scored.foottraffic,
            vibrancy: scored.vibrancy.score,
            traffic_score: components.traffic_score,
            dwell_score: components.dwell_score,
            spread_score: components.spread_score,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_scores(&self, scores: &[ScoredBuilding], path: &Path) -> Result<()> {
        self.write_to(scores, File::create(path)?)
    }

    pub fn write_to<W: Write>(&self, scores: &[ScoredBuilding], writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for scored in scores {
            csv_writer.serialize(ScoreRow::from(scored))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
