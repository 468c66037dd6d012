use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AnalyticsError, Result};
use crate::utils::constants::DWELL_BUCKETS;

/// Visits per day of week for one reporting period.
///
/// Depending on the export these are either percentages of the period's
/// traffic or raw counts. Scoring only depends on their shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekdayVisits {
    pub sunday: Option<f64>,
    pub monday: Option<f64>,
    pub tuesday: Option<f64>,
    pub wednesday: Option<f64>,
    pub thursday: Option<f64>,
    pub friday: Option<f64>,
    pub saturday: Option<f64>,
}

impl WeekdayVisits {
    /// Build from values ordered Sunday..Saturday
    pub fn from_values(values: [f64; 7]) -> Self {
        Self {
            sunday: Some(values[0]),
            monday: Some(values[1]),
            tuesday: Some(values[2]),
            wednesday: Some(values[3]),
            thursday: Some(values[4]),
            friday: Some(values[5]),
            saturday: Some(values[6]),
        }
    }

    pub fn get(&self, day: Weekday) -> Option<f64> {
        match day {
            Weekday::Sun => self.sunday,
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
        }
    }

    pub fn set(&mut self, day: Weekday, value: Option<f64>) {
        let slot = match day {
            Weekday::Sun => &mut self.sunday,
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
        };
        *slot = value;
    }

    /// Values Sunday..Saturday with missing days read as zero
    pub fn values(&self) -> [f64; 7] {
        [
            self.sunday.unwrap_or(0.0),
            self.monday.unwrap_or(0.0),
            self.tuesday.unwrap_or(0.0),
            self.wednesday.unwrap_or(0.0),
            self.thursday.unwrap_or(0.0),
            self.friday.unwrap_or(0.0),
            self.saturday.unwrap_or(0.0),
        ]
    }

    pub fn total(&self) -> f64 {
        self.values().iter().sum()
    }

    pub fn has_any(&self) -> bool {
        self.present_count() > 0
    }

    pub fn present_count(&self) -> usize {
        [
            self.sunday,
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

/// Visit counts per dwell-time bucket, ordered as `DWELL_BUCKETS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DwellTimeVisits {
    pub buckets: [Option<i64>; 8],
}

impl DwellTimeVisits {
    pub fn from_counts(counts: [i64; 8]) -> Self {
        Self {
            buckets: counts.map(Some),
        }
    }

    pub fn counts(&self) -> [i64; 8] {
        self.buckets.map(|b| b.unwrap_or(0))
    }

    pub fn total(&self) -> i64 {
        self.counts().iter().sum()
    }

    pub fn labels() -> impl Iterator<Item = &'static str> {
        DWELL_BUCKETS.iter().map(|(label, _)| *label)
    }
}

/// Estimated foot traffic by distance from home or work, ordered as `DISTANCE_BUCKETS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceEstimates {
    pub buckets: [Option<i64>; 5],
}

impl DistanceEstimates {
    pub fn from_counts(counts: [i64; 5]) -> Self {
        Self {
            buckets: counts.map(Some),
        }
    }

    pub fn counts(&self) -> [i64; 5] {
        self.buckets.map(|b| b.unwrap_or(0))
    }
}

/// One building's visit statistics for one reporting period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VisitRecord {
    #[validate(length(min = 1))]
    pub id: String,

    pub name: String,
    pub building_type: Option<String>,
    pub region_code: Option<String>,
    pub region_name: Option<String>,
    pub time_frame: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub foottraffic: Option<i64>,
    pub visit_duration_segmentation: Option<String>,
    pub address: Option<String>,

    pub weekday: WeekdayVisits,
    pub dwell: DwellTimeVisits,
    pub home_distance: DistanceEstimates,
    pub work_distance: DistanceEstimates,
    pub hourly: [Option<f64>; 24],
}

impl VisitRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            building_type: None,
            region_code: None,
            region_name: None,
            time_frame: None,
            lat: None,
            lng: None,
            start_date: None,
            end_date: None,
            foottraffic: None,
            visit_duration_segmentation: None,
            address: None,
            weekday: WeekdayVisits::default(),
            dwell: DwellTimeVisits::default(),
            home_distance: DistanceEstimates::default(),
            work_distance: DistanceEstimates::default(),
            hourly: [None; 24],
        }
    }

    pub fn foottraffic_or_zero(&self) -> i64 {
        self.foottraffic.unwrap_or(0)
    }

    /// Leading integer of the duration label, e.g. `"60_90"` -> 60
    pub fn duration_minutes(&self) -> Option<i64> {
        self.visit_duration_segmentation
            .as_deref()
            .and_then(|label| crate::readers::fields::parse_int(label.split('_').next()?))
    }

    /// Whether two records belong to the same comparison population
    pub fn is_comparable_to(&self, other: &VisitRecord) -> bool {
        self.time_frame == other.time_frame && self.region_code == other.region_code
    }

    pub fn starts_on_weekend(&self) -> bool {
        self.start_date
            .map(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .unwrap_or(false)
    }
}

pub struct VisitRecordBuilder {
    record: VisitRecord,
}

impl VisitRecordBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            record: VisitRecord::new(id, name),
        }
    }

    pub fn region(mut self, code: &str, name: &str) -> Self {
        self.record.region_code = Some(code.to_string());
        self.record.region_name = Some(name.to_string());
        self
    }

    pub fn time_frame(mut self, time_frame: &str) -> Self {
        self.record.time_frame = Some(time_frame.to_string());
        self
    }

    pub fn coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.record.lat = Some(lat);
        self.record.lng = Some(lng);
        self
    }

    pub fn period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.record.start_date = Some(start);
        self.record.end_date = Some(end);
        self
    }

    pub fn foottraffic(mut self, foottraffic: i64) -> Self {
        self.record.foottraffic = Some(foottraffic);
        self
    }

    pub fn duration(mut self, label: &str) -> Self {
        self.record.visit_duration_segmentation = Some(label.to_string());
        self
    }

    pub fn weekday(mut self, values: [f64; 7]) -> Self {
        self.record.weekday = WeekdayVisits::from_values(values);
        self
    }

    pub fn dwell(mut self, counts: [i64; 8]) -> Self {
        self.record.dwell = DwellTimeVisits::from_counts(counts);
        self
    }

    pub fn home_distance(mut self, counts: [i64; 5]) -> Self {
        self.record.home_distance = DistanceEstimates::from_counts(counts);
        self
    }

    pub fn work_distance(mut self, counts: [i64; 5]) -> Self {
        self.record.work_distance = DistanceEstimates::from_counts(counts);
        self
    }

    pub fn build(self) -> Result<VisitRecord> {
        if self.record.id.trim().is_empty() {
            return Err(AnalyticsError::MissingData("id".to_string()));
        }
        self.record.validate()?;
        Ok(self.record)
    }
}
