use crate::models::VisitRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Date-range and weekend filter applied before dashboard metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub include_weekends: bool,
}

impl DashboardFilter {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            include_weekends: true,
        }
    }

    pub fn with_weekends(mut self, include: bool) -> Self {
        self.include_weekends = include;
        self
    }

    /// Rows without a start date never match
    pub fn matches(&self, record: &VisitRecord) -> bool {
        let Some(start) = record.start_date else {
            return false;
        };
        let in_range = start >= self.from && start <= self.to;
        in_range && (self.include_weekends || !record.starts_on_weekend())
    }

    pub fn apply<'a>(&self, records: &'a [VisitRecord]) -> Vec<&'a VisitRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub property_count: usize,
    pub total_visitors: i64,
    pub avg_duration: i64,
    pub peak_region: String,
}

impl DashboardMetrics {
    /// Headline numbers for a set of rows; `None` when there are no rows
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a VisitRecord>) -> Option<Self> {
        let records: Vec<&VisitRecord> = records.into_iter().collect();
        if records.is_empty() {
            return None;
        }

        let property_count = records
            .iter()
            .map(|r| r.id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let total_visitors = records
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.foottraffic_or_zero()));

        let duration_sum = records
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.duration_minutes().unwrap_or(0)));
        let avg_duration = (duration_sum as f64 / records.len() as f64).round() as i64;

        // Insertion order breaks ties between equally busy regions
        let mut regions: Vec<(&str, i64)> = Vec::new();
        for record in &records {
            let Some(region) = record.region_name.as_deref() else {
                continue;
            };
            match regions.iter_mut().find(|(name, _)| *name == region) {
                Some((_, traffic)) => {
                    *traffic = traffic.saturating_add(record.foottraffic_or_zero())
                }
                None => regions.push((region, record.foottraffic_or_zero())),
            }
        }
        let peak_region = regions
            .iter()
            .fold(None::<&(&str, i64)>, |best, entry| match best {
                Some(b) if entry.1 <= b.1 => Some(b),
                _ => Some(entry),
            })
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        Some(Self {
            property_count,
            total_visitors,
            avg_duration,
            peak_region,
        })
    }

    pub fn average_per_property(&self) -> i64 {
        (self.total_visitors as f64 / self.property_count.max(1) as f64).round() as i64
    }

    pub fn summary(&self) -> String {
        format!(
            "Properties: {}\n\
            Total Visitors: {} (avg {} per building)\n\
            Average Duration: {} min\n\
            Peak Region: {}",
            self.property_count,
            self.total_visitors,
            self.average_per_property(),
            self.avg_duration,
            self.peak_region,
        )
    }
}

/// Column groups reported by the dataset profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnCategory {
    Identification,
    Location,
    Timeframe,
    TotalVisits,
    HomeBasedVisits,
    WorkBasedVisits,
}

const DISTANCE_FIELD_SUFFIXES: [&str; 14] = [
    "0.3", "0.5", "0.7", "1", "2", "3", "5", "7", "10", "30", "50", "100", "250", "250+",
];

impl ColumnCategory {
    pub const ALL: [ColumnCategory; 6] = [
        ColumnCategory::Identification,
        ColumnCategory::Location,
        ColumnCategory::Timeframe,
        ColumnCategory::TotalVisits,
        ColumnCategory::HomeBasedVisits,
        ColumnCategory::WorkBasedVisits,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ColumnCategory::Identification => "Basic Properties",
            ColumnCategory::Location => "Geographic Data",
            ColumnCategory::Timeframe => "Time Period",
            ColumnCategory::TotalVisits => "Total Visits",
            ColumnCategory::HomeBasedVisits => "Home-Based Visits",
            ColumnCategory::WorkBasedVisits => "Work-Based Visits",
        }
    }

    pub fn fields(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            ColumnCategory::Identification => &[
                "id",
                "name",
                "type",
                "publication_date",
                "version_code",
                "ticker_symbol",
                "company_name",
            ],
            ColumnCategory::Location => &[
                "lat",
                "lng",
                "region_type",
                "region_name",
                "region_code",
                "state_code",
                "address",
                "zipcode",
                "country",
                "country_code",
            ],
            ColumnCategory::Timeframe => &["time_frame", "start_date", "end_date"],
            ColumnCategory::TotalVisits => &["foottraffic", "visit_duration_segmentation"],
            ColumnCategory::HomeBasedVisits => return distance_fields("home"),
            ColumnCategory::WorkBasedVisits => return distance_fields("work"),
        };
        fixed.iter().map(|f| f.to_string()).collect()
    }
}

fn distance_fields(origin: &str) -> Vec<String> {
    let estimated = DISTANCE_FIELD_SUFFIXES
        .iter()
        .map(|s| format!("{}_distance_estimated_foottraffic_{}", origin, s));
    let percentage = DISTANCE_FIELD_SUFFIXES
        .iter()
        .map(|s| format!("{}_distance_percentage_{}", origin, s));
    estimated.chain(percentage).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPresence {
    pub category: ColumnCategory,
    pub present: usize,
    pub total: usize,
    pub columns: Vec<String>,
}

/// Shape of a loaded dataset: buildings, rows, period covered and which
/// column groups the export carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub unique_buildings: usize,
    pub row_count: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub total_fields: usize,
    pub categories: Vec<CategoryPresence>,
}

impl DatasetProfile {
    pub fn new(records: &[VisitRecord], headers: &[String]) -> Self {
        let unique_buildings = records
            .iter()
            .map(|r| r.name.as_str())
            .collect::<HashSet<_>>()
            .len();

        let dates = records
            .iter()
            .flat_map(|r| [r.start_date, r.end_date])
            .flatten();
        let date_range = dates.fold(None, |range: Option<(NaiveDate, NaiveDate)>, d| {
            Some(match range {
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
                None => (d, d),
            })
        });

        let header_set: HashSet<&str> = headers.iter().map(String::as_str).collect();
        let categories: Vec<CategoryPresence> = ColumnCategory::ALL
            .iter()
            .map(|&category| {
                let fields = category.fields();
                let total = fields.len();
                let columns: Vec<String> = fields
                    .into_iter()
                    .filter(|f| header_set.contains(f.as_str()))
                    .collect();
                CategoryPresence {
                    category,
                    present: columns.len(),
                    total,
                    columns,
                }
            })
            .collect();

        Self {
            unique_buildings,
            row_count: records.len(),
            date_range,
            total_fields: categories.iter().map(|c| c.present).sum(),
            categories,
        }
    }

    pub fn summary(&self) -> String {
        let period = match self.date_range {
            Some((start, end)) => format!("{} to {}", start.format("%b %Y"), end.format("%b %Y")),
            None => "No dated rows".to_string(),
        };

        format!(
            "Buildings: {} unique\n\
            Rows: {} total\n\
            Date Range: {}\n\
            Known Columns: {}",
            self.unique_buildings, self.row_count, period, self.total_fields,
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut lines = vec![self.summary(), String::new(), "Column Coverage:".to_string()];
        for presence in &self.categories {
            lines.push(format!(
                "- {}: {}/{} ({:.0}%)",
                presence.category.title(),
                presence.present,
                presence.total,
                presence.present as f64 / presence.total as f64 * 100.0,
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitRecordBuilder;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<VisitRecord> {
        vec![
            // 2024-06-01 is a Saturday
            VisitRecordBuilder::new("a", "Alpha")
                .region("IL", "Illinois")
                .period(date(2024, 6, 1), date(2024, 6, 30))
                .foottraffic(1000)
                .duration("60_90")
                .build()
                .unwrap(),
            VisitRecordBuilder::new("b", "Bravo")
                .region("NY", "New York")
                .period(date(2024, 7, 1), date(2024, 7, 31))
                .foottraffic(3000)
                .duration("30_45")
                .build()
                .unwrap(),
            VisitRecordBuilder::new("a", "Alpha")
                .region("IL", "Illinois")
                .period(date(2024, 7, 1), date(2024, 7, 31))
                .foottraffic(2500)
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_filter_by_range_and_weekend() {
        let records = sample();
        let filter = DashboardFilter::new(date(2024, 6, 1), date(2024, 7, 31));
        assert_eq!(filter.apply(&records).len(), 3);

        let weekdays_only = filter.with_weekends(false);
        assert_eq!(weekdays_only.apply(&records).len(), 2);

        let july = DashboardFilter::new(date(2024, 7, 1), date(2024, 7, 1));
        assert_eq!(july.apply(&records).len(), 2);

        assert!(!filter.matches(&VisitRecord::new("x", "Undated")));
    }

    #[test]
    fn test_dashboard_metrics() {
        let records = sample();
        let metrics = DashboardMetrics::from_records(&records).unwrap();

        assert_eq!(metrics.property_count, 2);
        assert_eq!(metrics.total_visitors, 6500);
        // (60 + 30 + 0) / 3
        assert_eq!(metrics.avg_duration, 30);
        assert_eq!(metrics.peak_region, "Illinois");
        assert_eq!(metrics.average_per_property(), 3250);

        assert!(DashboardMetrics::from_records(Vec::<&VisitRecord>::new()).is_none());
    }

    #[test]
    fn test_huge_traffic_saturates() {
        let records: Vec<VisitRecord> = ["a", "b"]
            .iter()
            .map(|id| {
                VisitRecordBuilder::new(*id, "Huge")
                    .region("IL", "Illinois")
                    .foottraffic(i64::MAX)
                    .build()
                    .unwrap()
            })
            .collect();

        let metrics = DashboardMetrics::from_records(&records).unwrap();
        assert_eq!(metrics.total_visitors, i64::MAX);
        assert_eq!(metrics.peak_region, "Illinois");
    }

    #[test]
    fn test_peak_region_defaults() {
        let records = vec![VisitRecord::new("x", "No Region")];
        let metrics = DashboardMetrics::from_records(&records).unwrap();
        assert_eq!(metrics.peak_region, "N/A");
    }

    #[test]
    fn test_dataset_profile() {
        let headers: Vec<String> = ["id", "name", "lat", "lng", "start_date", "foottraffic"]
            .iter()
            .chain(["home_distance_estimated_foottraffic_1", "unrelated"].iter())
            .map(|s| s.to_string())
            .collect();

        let profile = DatasetProfile::new(&sample(), &headers);
        assert_eq!(profile.unique_buildings, 2);
        assert_eq!(profile.row_count, 3);
        assert_eq!(profile.date_range, Some((date(2024, 6, 1), date(2024, 7, 31))));
        assert_eq!(profile.total_fields, 7);

        let identification = &profile.categories[0];
        assert_eq!(identification.present, 2);
        assert_eq!(identification.total, 7);

        let home = &profile.categories[4];
        assert_eq!(home.total, 28);
        assert_eq!(home.columns, vec!["home_distance_estimated_foottraffic_1"]);

        assert!(profile.summary().contains("Jun 2024 to Jul 2024"));
        assert!(profile.detailed_summary().contains("Home-Based Visits: 1/28"));
    }
}
