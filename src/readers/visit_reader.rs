use crate::error::Result;
use crate::models::{DistanceEstimates, DwellTimeVisits, VisitRecord, WeekdayVisits};
use crate::readers::fields::{decode_text, parse_float, parse_int, FieldSource, HeaderIndex};
use crate::utils::constants::*;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// How columns of a visit export are addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColumnLayout {
    /// First row names every column
    #[default]
    Header,
    /// Fixed column-index contract of the map export
    Positional,
}

/// Result of loading one export
#[derive(Debug, Clone, Default)]
pub struct VisitDataset {
    pub headers: Vec<String>,
    pub records: Vec<VisitRecord>,
    pub skipped_rows: usize,
}

pub struct VisitReader {
    layout: ColumnLayout,
}

impl VisitReader {
    pub fn new() -> Self {
        Self {
            layout: ColumnLayout::Header,
        }
    }

    pub fn with_layout(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// Read visit records from a CSV export
    pub fn read_visits(&self, path: &Path) -> Result<Vec<VisitRecord>> {
        Ok(self.load(path)?.records)
    }

    /// Read a CSV or JSON export, keeping headers and skip counts
    pub fn load(&self, path: &Path) -> Result<VisitDataset> {
        let bytes = std::fs::read(path)?;
        let text = decode_text(&bytes);

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let dataset = if is_json {
            self.parse_json(&text)?
        } else {
            self.parse_csv(&text)?
        };

        info!(
            path = %path.display(),
            records = dataset.records.len(),
            skipped = dataset.skipped_rows,
            "Loaded visit export"
        );

        Ok(dataset)
    }

    /// Parse CSV text according to the reader's layout
    pub fn parse_csv(&self, text: &str) -> Result<VisitDataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let index = HeaderIndex::new(&headers);
        let mut dataset = VisitDataset {
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
            ..Default::default()
        };

        for (line, result) in reader.records().enumerate() {
            let row = result?;

            // Skip empty lines
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let parsed = match self.layout {
                ColumnLayout::Header => visit_from_fields(&index.row(&row)),
                ColumnLayout::Positional => visit_from_positions(&row),
            };

            match parsed {
                Some(record) => dataset.records.push(record),
                None => {
                    debug!(line = line + 2, "Skipping unusable visit row");
                    dataset.skipped_rows += 1;
                }
            }
        }

        Ok(dataset)
    }

    /// Parse a JSON array of objects with named fields
    pub fn parse_json(&self, text: &str) -> Result<VisitDataset> {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(text)?;
        let mut dataset = VisitDataset::default();

        if let Some(first) = rows.first() {
            dataset.headers = first.keys().cloned().collect();
        }

        for row in &rows {
            let fields: HashMap<String, String> = row
                .iter()
                .filter_map(|(k, v)| json_cell(v).map(|cell| (k.clone(), cell)))
                .collect();

            match visit_from_fields(&fields) {
                Some(record) => dataset.records.push(record),
                None => dataset.skipped_rows += 1,
            }
        }

        Ok(dataset)
    }
}

impl Default for VisitReader {
    fn default() -> Self {
        Self::new()
    }
}

fn json_cell(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Key of an hourly column; exports disagree on whether the last slot ends at 00:00 or 24:00
fn hourly_keys(hour: usize) -> [String; 2] {
    [
        format!("visits_by_hour_of_day_{:02}:00_{:02}:00", hour, (hour + 1) % 24),
        format!("visits_by_hour_of_day_{:02}:00_{:02}:00", hour, hour + 1),
    ]
}

/// Build a record from named fields. Rows without an id are unusable.
pub fn visit_from_fields<S: FieldSource>(src: &S) -> Option<VisitRecord> {
    let id = src.text("id")?;
    let mut record = VisitRecord::new(id, src.text("name").unwrap_or_default());

    record.building_type = src.text("type");
    record.region_code = src.text("region_code").or_else(|| src.text("state_code"));
    record.region_name = src.text("region_name");
    record.time_frame = src.text("time_frame");
    record.lat = src.float("lat");
    record.lng = src.float("lng");
    record.start_date = src.date("start_date");
    record.end_date = src.date("end_date");
    record.foottraffic = src.int("foottraffic");
    record.visit_duration_segmentation = src.text("visit_duration_segmentation");
    record.address = src.text("address");

    let mut weekday = WeekdayVisits::default();
    for (day, suffix) in WEEKDAYS.iter().zip(WEEKDAY_FIELDS) {
        weekday.set(*day, src.float(&format!("visits_by_day_of_week_{}", suffix)));
    }
    record.weekday = weekday;

    let mut dwell = DwellTimeVisits::default();
    for (slot, label) in dwell.buckets.iter_mut().zip(DwellTimeVisits::labels()) {
        *slot = src.int(&format!("visits_by_dwell_time_{}", label));
    }
    record.dwell = dwell;

    record.home_distance = distance_from_fields(src, "home");
    record.work_distance = distance_from_fields(src, "work");

    for (hour, slot) in record.hourly.iter_mut().enumerate() {
        *slot = hourly_keys(hour).iter().find_map(|key| src.float(key));
    }

    Some(record)
}

fn distance_from_fields<S: FieldSource>(src: &S, origin: &str) -> DistanceEstimates {
    let mut estimates = DistanceEstimates::default();
    for (slot, (suffix, _)) in estimates.buckets.iter_mut().zip(DISTANCE_BUCKETS) {
        *slot = src.int(&format!(
            "{}_distance_estimated_foottraffic_{}",
            origin, suffix
        ));
    }
    estimates
}

/// Build a record from the positional contract. Rows without numeric
/// coordinates are dropped, as the map view cannot place them.
pub fn visit_from_positions(row: &csv::StringRecord) -> Option<VisitRecord> {
    let cell = |i: usize| row.get(i).map(str::trim).filter(|s| !s.is_empty());

    let lat = cell(COL_LAT).and_then(parse_float)?;
    let lng = cell(COL_LNG).and_then(parse_float)?;
    let id = cell(COL_ID)?;

    let mut record = VisitRecord::new(id, cell(COL_NAME).unwrap_or_default());
    record.lat = Some(lat);
    record.lng = Some(lng);
    record.region_code = cell(COL_ADDRESS_STATE).map(str::to_string);
    record.start_date = cell(COL_START_DATE).and_then(crate::readers::fields::parse_date);
    record.end_date = cell(COL_END_DATE).and_then(crate::readers::fields::parse_date);
    record.visit_duration_segmentation = cell(COL_VISIT_DURATION).map(str::to_string);
    record.foottraffic = cell(COL_FOOTTRAFFIC).and_then(parse_int);
    record.address = Some(format!(
        "{}, {}, {}",
        cell(COL_ADDRESS_STREET).unwrap_or_default(),
        cell(COL_ADDRESS_STATE).unwrap_or_default(),
        cell(COL_ADDRESS_ZIP).unwrap_or_default()
    ));

    let mut weekday = WeekdayVisits::default();
    for (offset, day) in WEEKDAYS.iter().enumerate() {
        weekday.set(
            *day,
            cell(COL_WEEKDAY_SUNDAY + offset)
                .and_then(parse_int)
                .map(|v| v as f64),
        );
    }
    record.weekday = weekday;

    Some(record)
}
