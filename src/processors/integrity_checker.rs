use crate::models::VisitRecord;
use crate::utils::constants::{DEFAULT_WEEKDAY_TOLERANCE, PERCENTAGE_SUM_CEILING};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub total_records: usize,
    pub clean_records: usize,
    pub flagged_records: usize,
    pub missing_traffic_records: usize,
    pub missing_date_records: usize,
    pub violations: Vec<IntegrityViolation>,
    pub building_statistics: HashMap<String, BuildingStatistics>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count_of(&self, violation_type: ViolationType) -> usize {
        self.violations
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityViolation {
    pub building_id: String,
    pub start_date: Option<NaiveDate>,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationType {
    WeekdayDrift,
    InvertedPeriod,
    NegativeTraffic,
    MissingTraffic,
    MissingDates,
    InvalidCoordinates,
    DuplicatePeriod,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildingStatistics {
    pub total_records: usize,
    pub flagged_records: usize,
    pub min_traffic: Option<i64>,
    pub max_traffic: Option<i64>,
}

/// Reports data-quality problems in visit records without rejecting them
pub struct IntegrityChecker {
    weekday_tolerance: f64,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            weekday_tolerance: DEFAULT_WEEKDAY_TOLERANCE,
        }
    }

    pub fn with_weekday_tolerance(weekday_tolerance: f64) -> Self {
        Self { weekday_tolerance }
    }

    pub fn check_integrity(&self, records: &[VisitRecord]) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_records: records.len(),
            clean_records: 0,
            flagged_records: 0,
            missing_traffic_records: 0,
            missing_date_records: 0,
            violations: Vec::new(),
            building_statistics: HashMap::new(),
        };

        let mut seen_periods: HashSet<(&str, Option<NaiveDate>)> = HashSet::new();

        for record in records {
            let before = report.violations.len();
            self.check_record(record, &mut report);

            if !seen_periods.insert((record.id.as_str(), record.start_date)) {
                report.violations.push(violation(
                    record,
                    ViolationType::DuplicatePeriod,
                    format!(
                        "duplicate row for period starting {}",
                        describe_date(record.start_date)
                    ),
                ));
            }

            let flagged = report.violations.len() > before;
            if flagged {
                report.flagged_records += 1;
            } else {
                report.clean_records += 1;
            }

            let stats = report
                .building_statistics
                .entry(record.id.clone())
                .or_default();
            stats.total_records += 1;
            if flagged {
                stats.flagged_records += 1;
            }
            if let Some(traffic) = record.foottraffic {
                stats.min_traffic = Some(stats.min_traffic.map_or(traffic, |t| t.min(traffic)));
                stats.max_traffic = Some(stats.max_traffic.map_or(traffic, |t| t.max(traffic)));
            }
        }

        debug!(
            total = report.total_records,
            flagged = report.flagged_records,
            "Integrity check complete"
        );
        report
    }

    fn check_record(&self, record: &VisitRecord, report: &mut IntegrityReport) {
        self.check_weekday_sum(record, report);

        match (record.start_date, record.end_date) {
            (Some(start), Some(end)) if start > end => {
                report.violations.push(violation(
                    record,
                    ViolationType::InvertedPeriod,
                    format!("start {} is after end {}", start, end),
                ));
            }
            (Some(_), Some(_)) => {}
            (start, end) => {
                report.missing_date_records += 1;
                let missing: Vec<&str> = [("start_date", start), ("end_date", end)]
                    .iter()
                    .filter(|(_, d)| d.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                report.violations.push(violation(
                    record,
                    ViolationType::MissingDates,
                    format!("missing {}", missing.join(" and ")),
                ));
            }
        }

        match record.foottraffic {
            Some(traffic) if traffic < 0 => {
                report.violations.push(violation(
                    record,
                    ViolationType::NegativeTraffic,
                    format!("foot traffic {} is negative", traffic),
                ));
            }
            Some(_) => {}
            None => {
                report.missing_traffic_records += 1;
                report.violations.push(violation(
                    record,
                    ViolationType::MissingTraffic,
                    "foot traffic is missing or not numeric".to_string(),
                ));
            }
        }

        if let Err(errors) = record.validate() {
            let fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|f| f.to_string())
                .collect();
            if fields.iter().any(|f| f == "lat" || f == "lng") {
                report.violations.push(violation(
                    record,
                    ViolationType::InvalidCoordinates,
                    format!(
                        "coordinates ({}, {}) outside valid bounds",
                        describe_coord(record.lat),
                        describe_coord(record.lng)
                    ),
                ));
            }
        }
    }

    /// Weekday values that look like percentages should add up to 100
    fn check_weekday_sum(&self, record: &VisitRecord, report: &mut IntegrityReport) {
        if !record.weekday.has_any() {
            return;
        }

        let sum = record.weekday.total();
        if sum > PERCENTAGE_SUM_CEILING {
            return;
        }

        let drift = (sum - 100.0).abs();
        if drift > self.weekday_tolerance {
            report.violations.push(violation(
                record,
                ViolationType::WeekdayDrift,
                format!(
                    "weekday shares sum to {:.1}, {:.1} points from 100",
                    sum, drift
                ),
            ));
        }
    }

    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let total = report.total_records.max(1) as f64;
        let mut summary = String::new();

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        summary.push_str(&format!(
            "Clean Records: {} ({:.1}%)\n",
            report.clean_records,
            100.0 * report.clean_records as f64 / total
        ));
        summary.push_str(&format!(
            "Flagged Records: {} ({:.1}%)\n",
            report.flagged_records,
            100.0 * report.flagged_records as f64 / total
        ));
        summary.push_str(&format!(
            "Missing Traffic: {}\nMissing Dates: {}\n",
            report.missing_traffic_records, report.missing_date_records
        ));
        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));

        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, v) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Building {} ({}): {:?} - {}\n",
                    i + 1,
                    v.building_id,
                    describe_date(v.start_date),
                    v.violation_type,
                    v.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn violation(
    record: &VisitRecord,
    violation_type: ViolationType,
    details: String,
) -> IntegrityViolation {
    IntegrityViolation {
        building_id: record.id.clone(),
        start_date: record.start_date,
        violation_type,
        details,
    }
}

fn describe_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| "undated".to_string())
}

fn describe_coord(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitRecordBuilder;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clean(id: &str, month: u32) -> VisitRecord {
        VisitRecordBuilder::new(id, "Building")
            .period(date(2024, month, 1), date(2024, month, 28))
            .foottraffic(1000)
            .coordinates(41.88, -87.63)
            .weekday([10.0, 15.0, 15.0, 15.0, 15.0, 20.0, 10.0])
            .build()
            .unwrap()
    }

    #[test]
    fn test_clean_records_pass() {
        let records = vec![clean("a", 1), clean("a", 2), clean("b", 1)];
        let report = IntegrityChecker::new().check_integrity(&records);

        assert!(report.is_clean());
        assert_eq!(report.clean_records, 3);
        assert_eq!(report.building_statistics["a"].total_records, 2);
    }

    #[test]
    fn test_weekday_drift_beyond_tolerance() {
        let mut within = clean("a", 1);
        within.weekday.monday = Some(18.0);
        let mut drifting = clean("b", 1);
        drifting.weekday.monday = Some(25.0);
        let mut counts = clean("c", 1);
        counts.weekday = crate::models::WeekdayVisits::from_values([500.0; 7]);

        let report = IntegrityChecker::new().check_integrity(&[within, drifting, counts]);
        assert_eq!(report.count_of(ViolationType::WeekdayDrift), 1);
        assert_eq!(report.violations[0].building_id, "b");

        let strict = IntegrityChecker::with_weekday_tolerance(1.0);
        let mut within = clean("a", 1);
        within.weekday.monday = Some(18.0);
        assert_eq!(
            strict
                .check_integrity(&[within])
                .count_of(ViolationType::WeekdayDrift),
            1
        );
    }

    #[test]
    fn test_record_level_violations() {
        let mut inverted = clean("a", 1);
        inverted.end_date = Some(date(2023, 12, 1));
        let mut negative = clean("b", 1);
        negative.foottraffic = Some(-5);
        let mut missing = clean("c", 1);
        missing.foottraffic = None;
        missing.end_date = None;
        let mut off_map = clean("d", 1);
        off_map.lat = Some(123.0);

        let report =
            IntegrityChecker::new().check_integrity(&[inverted, negative, missing, off_map]);

        assert_eq!(report.count_of(ViolationType::InvertedPeriod), 1);
        assert_eq!(report.count_of(ViolationType::NegativeTraffic), 1);
        assert_eq!(report.count_of(ViolationType::MissingTraffic), 1);
        assert_eq!(report.count_of(ViolationType::MissingDates), 1);
        assert_eq!(report.count_of(ViolationType::InvalidCoordinates), 1);
        assert_eq!(report.flagged_records, 4);
        assert_eq!(report.missing_traffic_records, 1);
        assert_eq!(report.missing_date_records, 1);
    }

    #[test]
    fn test_duplicate_periods() {
        let records = vec![clean("a", 1), clean("a", 1), clean("a", 2)];
        let report = IntegrityChecker::new().check_integrity(&records);

        assert_eq!(report.count_of(ViolationType::DuplicatePeriod), 1);
        assert_eq!(report.building_statistics["a"].flagged_records, 1);
    }

    #[test]
    fn test_summary_lists_violations() {
        let mut negative = clean("b", 1);
        negative.foottraffic = Some(-5);
        let checker = IntegrityChecker::new();
        let report = checker.check_integrity(&[negative]);
        let summary = checker.generate_summary(&report);

        assert!(summary.contains("Total Records: 1"));
        assert!(summary.contains("NegativeTraffic"));
        assert!(checker
            .generate_summary(&checker.check_integrity(&[]))
            .contains("Violations: 0"));
    }
}
