use crate::models::{DistanceEstimates, VisitRecord};
use crate::utils::constants::DISTANCE_BUCKETS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which origin a distance estimate is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    #[default]
    Home,
    Work,
}

impl DistanceKind {
    fn estimates(self, record: &VisitRecord) -> &DistanceEstimates {
        match self {
            DistanceKind::Home => &record.home_distance,
            DistanceKind::Work => &record.work_distance,
        }
    }
}

impl fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceKind::Home => write!(f, "Home"),
            DistanceKind::Work => write!(f, "Work"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceBucket {
    pub distance: String,
    pub count: i64,
}

fn to_buckets(counts: [i64; 5]) -> Vec<DistanceBucket> {
    DISTANCE_BUCKETS
        .iter()
        .zip(counts)
        .map(|((_, label), count)| DistanceBucket {
            distance: label.to_string(),
            count,
        })
        .collect()
}

/// Visitors by distance from home or work.
///
/// Without a building every record is summed; with one, only its first
/// record counts and an unknown id gives no buckets.
pub fn distance_distribution(
    records: &[VisitRecord],
    building: Option<&str>,
    kind: DistanceKind,
) -> Vec<DistanceBucket> {
    collect_buckets(records, building, |record| kind.estimates(record).counts())
}

/// Home-distance buckets scaled down to the building's long-stay visitors
pub fn worker_distance_distribution(
    records: &[VisitRecord],
    building: Option<&str>,
) -> Vec<DistanceBucket> {
    collect_buckets(records, building, |record| {
        let ratio = long_stay_ratio(record);
        record
            .home_distance
            .counts()
            .map(|count| (count as f64 * ratio).round() as i64)
    })
}

/// Long-stay visits (leading integer of the duration label) over foot
/// traffic, with zero or missing traffic read as one
fn long_stay_ratio(record: &VisitRecord) -> f64 {
    let long_visits = record.duration_minutes().unwrap_or(0) as f64;
    let traffic = match record.foottraffic {
        Some(t) if t != 0 => t as f64,
        _ => 1.0,
    };
    long_visits / traffic
}

fn collect_buckets<F>(records: &[VisitRecord], building: Option<&str>, counts: F) -> Vec<DistanceBucket>
where
    F: Fn(&VisitRecord) -> [i64; 5],
{
    if records.is_empty() {
        return Vec::new();
    }

    match building {
        Some(id) => records
            .iter()
            .find(|r| r.id == id)
            .map(|record| to_buckets(counts(record)))
            .unwrap_or_default(),
        None => {
            let totals = records.iter().fold([0i64; 5], |mut acc, record| {
                for (total, count) in acc.iter_mut().zip(counts(record)) {
                    *total = total.saturating_add(count);
                }
                acc
            });
            to_buckets(totals)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitRecordBuilder;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<VisitRecord> {
        vec![
            VisitRecordBuilder::new("a", "Alpha")
                .foottraffic(1000)
                .duration("120_150")
                .home_distance([100, 200, 300, 400, 500])
                .work_distance([10, 20, 30, 40, 50])
                .build()
                .unwrap(),
            VisitRecordBuilder::new("b", "Bravo")
                .home_distance([1, 2, 3, 4, 5])
                .build()
                .unwrap(),
            VisitRecordBuilder::new("a", "Alpha")
                .home_distance([9, 9, 9, 9, 9])
                .build()
                .unwrap(),
        ]
    }

    fn counts(buckets: &[DistanceBucket]) -> Vec<i64> {
        buckets.iter().map(|b| b.count).collect()
    }

    #[test]
    fn test_aggregate_distribution() {
        let buckets = distance_distribution(&sample(), None, DistanceKind::Home);
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[0].distance, "0-1 km");
        assert_eq!(buckets[4].distance, "10+ km");
        assert_eq!(counts(&buckets), vec![110, 211, 312, 413, 514]);
    }

    #[test]
    fn test_aggregate_saturates_on_huge_counts() {
        let records: Vec<VisitRecord> = ["a", "b"]
            .iter()
            .map(|id| {
                VisitRecordBuilder::new(*id, "Huge")
                    .home_distance([i64::MAX, 1, 0, 0, 0])
                    .build()
                    .unwrap()
            })
            .collect();

        let buckets = distance_distribution(&records, None, DistanceKind::Home);
        assert_eq!(counts(&buckets), vec![i64::MAX, 2, 0, 0, 0]);
    }

    #[test]
    fn test_single_building_uses_first_record() {
        let buckets = distance_distribution(&sample(), Some("a"), DistanceKind::Work);
        assert_eq!(counts(&buckets), vec![10, 20, 30, 40, 50]);

        assert!(distance_distribution(&sample(), Some("zzz"), DistanceKind::Home).is_empty());
        assert!(distance_distribution(&[], None, DistanceKind::Home).is_empty());
    }

    #[test]
    fn test_worker_distribution_scales_by_long_stays() {
        // 120 long stays out of 1000 visits
        let buckets = worker_distance_distribution(&sample(), Some("a"));
        assert_eq!(counts(&buckets), vec![12, 24, 36, 48, 60]);

        // no duration label: every bucket rounds to zero
        let buckets = worker_distance_distribution(&sample(), Some("b"));
        assert_eq!(counts(&buckets), vec![0, 0, 0, 0, 0]);
    }
}
