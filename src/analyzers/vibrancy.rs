//! Composite vibrancy score.
//!
//! A building's vibrancy blends three ratios, each in `[0, 1]`:
//!
//! - **traffic**: its foot traffic relative to the busiest comparable building
//! - **dwell**: a weighted average of its dwell-time buckets, longer stays weigh more
//! - **spread**: how evenly its visits are spread across the week
//!
//! Scoring is total: missing or degenerate inputs contribute zero, never an error.

use crate::models::VisitRecord;
use crate::utils::constants::{DWELL_BUCKETS, DWELL_WEIGHT, SPREAD_WEIGHT, TRAFFIC_WEIGHT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VibrancyWeights {
    pub traffic: f64,
    pub dwell: f64,
    pub spread: f64,
}

impl Default for VibrancyWeights {
    fn default() -> Self {
        Self {
            traffic: TRAFFIC_WEIGHT,
            dwell: DWELL_WEIGHT,
            spread: SPREAD_WEIGHT,
        }
    }
}

impl VibrancyWeights {
    pub fn is_valid(&self) -> bool {
        let parts = [self.traffic, self.dwell, self.spread];
        parts.iter().all(|w| w.is_finite() && *w >= 0.0)
            && (parts.iter().sum::<f64>() - 1.0).abs() < 1e-6
    }
}

/// Sub-scores as integer percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub traffic_score: u8,
    pub dwell_score: u8,
    pub spread_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrancyScore {
    pub score: u8,
    pub components: ScoreComponents,
}

/// A building's score for one reporting period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBuilding {
    pub id: String,
    pub name: String,
    pub region_code: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub foottraffic: Option<i64>,
    pub vibrancy: VibrancyScore,
}

impl ScoredBuilding {
    pub fn new(record: &VisitRecord, vibrancy: VibrancyScore) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            region_code: record.region_code.clone(),
            start_date: record.start_date,
            foottraffic: record.foottraffic,
            vibrancy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub date: NaiveDate,
    pub score: u8,
}

/// Score history of one building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSeries {
    pub id: String,
    pub name: String,
    pub points: Vec<ScorePoint>,
}

#[derive(Debug, Clone, Default)]
pub struct VibrancyCalculator {
    weights: VibrancyWeights,
}

impl VibrancyCalculator {
    pub fn new() -> Self {
        Self {
            weights: VibrancyWeights::default(),
        }
    }

    pub fn with_weights(weights: VibrancyWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> VibrancyWeights {
        self.weights
    }

    /// Score `target` against the members of `population` sharing its
    /// region and time frame
    pub fn score(&self, target: &VisitRecord, population: &[VisitRecord]) -> VibrancyScore {
        let peers: Vec<&VisitRecord> = population
            .iter()
            .filter(|r| r.is_comparable_to(target))
            .collect();
        self.score_within(target, &peers)
    }

    /// Score `target` against an already-filtered comparison set
    pub fn score_within(&self, target: &VisitRecord, peers: &[&VisitRecord]) -> VibrancyScore {
        let traffic = traffic_ratio(target, peers.iter().copied());
        let dwell = dwell_ratio(target);
        let spread = spread_ratio(target);

        let composite =
            self.weights.traffic * traffic + self.weights.dwell * dwell + self.weights.spread * spread;

        VibrancyScore {
            score: to_percent(composite),
            components: ScoreComponents {
                traffic_score: to_percent(traffic),
                dwell_score: to_percent(dwell),
                spread_score: to_percent(spread),
            },
        }
    }

    /// One score per building and `start_date`, each scored against the
    /// records sharing that date
    pub fn vibrancy_series(&self, records: &[VisitRecord]) -> Vec<ScoreSeries> {
        let mut by_date: HashMap<NaiveDate, Vec<&VisitRecord>> = HashMap::new();
        for record in records {
            if let Some(date) = record.start_date {
                by_date.entry(date).or_default().push(record);
            }
        }

        let mut series: BTreeMap<&str, ScoreSeries> = BTreeMap::new();
        for record in records {
            let Some(date) = record.start_date else {
                continue;
            };

            let peers: Vec<&VisitRecord> = by_date
                .get(&date)
                .map(|same_date| {
                    same_date
                        .iter()
                        .copied()
                        .filter(|r| r.is_comparable_to(record))
                        .collect()
                })
                .unwrap_or_default();

            let score = self.score_within(record, &peers).score;
            series
                .entry(record.id.as_str())
                .or_insert_with(|| ScoreSeries {
                    id: record.id.clone(),
                    name: record.name.clone(),
                    points: Vec::new(),
                })
                .points
                .push(ScorePoint { date, score });
        }

        series
            .into_values()
            .map(|mut s| {
                s.points.sort_by_key(|p| p.date);
                s
            })
            .collect()
    }

    /// Latest record of every building, scored against the other latest
    /// records and ranked best first
    pub fn leaderboard(&self, records: &[VisitRecord]) -> Vec<ScoredBuilding> {
        let latest = latest_per_building(records);

        let mut scored: Vec<ScoredBuilding> = latest
            .iter()
            .map(|record| {
                let peers: Vec<&VisitRecord> = latest
                    .iter()
                    .copied()
                    .filter(|r| r.is_comparable_to(record))
                    .collect();
                ScoredBuilding::new(record, self.score_within(record, &peers))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.vibrancy
                .score
                .cmp(&a.vibrancy.score)
                .then_with(|| a.name.cmp(&b.name))
        });
        scored
    }
}

/// Most recent record per building id; undated records lose to dated ones
pub fn latest_per_building(records: &[VisitRecord]) -> Vec<&VisitRecord> {
    let mut latest: BTreeMap<&str, &VisitRecord> = BTreeMap::new();
    for record in records {
        latest
            .entry(record.id.as_str())
            .and_modify(|current| {
                if record.start_date > current.start_date {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest.into_values().collect()
}

/// Target traffic over the largest positive traffic among peers
pub fn traffic_ratio<'a>(
    target: &VisitRecord,
    peers: impl IntoIterator<Item = &'a VisitRecord>,
) -> f64 {
    let max_traffic = peers
        .into_iter()
        .map(VisitRecord::foottraffic_or_zero)
        .filter(|&v| v > 0)
        .max();

    match max_traffic {
        Some(max) => (target.foottraffic_or_zero() as f64 / max as f64).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// Weighted share of visits by dwell bucket
pub fn dwell_ratio(record: &VisitRecord) -> f64 {
    let counts = record.dwell.counts().map(|c| c.max(0) as f64);
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = counts
        .iter()
        .zip(DWELL_BUCKETS.iter())
        .map(|(count, (_, weight))| count * weight)
        .sum();

    (weighted / total).clamp(0.0, 1.0)
}

/// `1 - variance / mean^2` over the seven weekday values
pub fn spread_ratio(record: &VisitRecord) -> f64 {
    // Weekday cells count whole visits
    let values = record.weekday.values().map(f64::trunc);
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mean = total / 7.0;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 7.0;

    (1.0 - variance / (mean * mean)).clamp(0.0, 1.0)
}

fn to_percent(ratio: f64) -> u8 {
    if !ratio.is_finite() {
        return 0;
    }
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}
