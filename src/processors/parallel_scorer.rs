use crate::analyzers::vibrancy::{ScoredBuilding, VibrancyCalculator, VibrancyWeights};
use crate::error::{AnalyticsError, Result};
use crate::models::VisitRecord;
use crate::processors::{IntegrityChecker, IntegrityReport};
use crate::utils::constants::DEFAULT_WEEKDAY_TOLERANCE;
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

type PeerKey<'a> = (Option<&'a str>, Option<&'a str>);

/// Scores a whole dataset on a bounded rayon pool
pub struct ParallelScorer {
    max_workers: usize,
    weights: VibrancyWeights,
    weekday_tolerance: f64,
}

impl ParallelScorer {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            weights: VibrancyWeights::default(),
            weekday_tolerance: DEFAULT_WEEKDAY_TOLERANCE,
        }
    }

    pub fn with_weights(mut self, weights: VibrancyWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_weekday_tolerance(mut self, weekday_tolerance: f64) -> Self {
        self.weekday_tolerance = weekday_tolerance;
        self
    }

    /// Check integrity, then score every record against its region and
    /// time-frame peers
    pub fn process(
        &self,
        records: &[VisitRecord],
        progress: Option<&ProgressReporter>,
    ) -> Result<(Vec<ScoredBuilding>, IntegrityReport)> {
        if let Some(p) = progress {
            p.set_message("Checking data integrity...");
        }
        let checker = IntegrityChecker::with_weekday_tolerance(self.weekday_tolerance);
        let integrity_report = checker.check_integrity(records);

        let scored = self.score_all(records, progress)?;
        Ok((scored, integrity_report))
    }

    /// Scores in input order
    pub fn score_all(
        &self,
        records: &[VisitRecord],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<ScoredBuilding>> {
        let total = records.len();
        let processed_count = AtomicUsize::new(0);

        if let Some(p) = progress {
            p.set_message(&format!("Scoring {} records...", total));
        }

        let mut groups: HashMap<PeerKey, Vec<&VisitRecord>> = HashMap::new();
        for record in records {
            groups.entry(peer_key(record)).or_default().push(record);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| AnalyticsError::Config(e.to_string()))?;

        let calculator = VibrancyCalculator::with_weights(self.weights);

        let scored: Vec<ScoredBuilding> = pool.install(|| {
            records
                .par_iter()
                .map(|record| {
                    let peers = groups
                        .get(&peer_key(record))
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    let result = ScoredBuilding::new(record, calculator.score_within(record, peers));

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    result
                })
                .collect()
        });

        info!(
            records = total,
            groups = groups.len(),
            workers = self.max_workers,
            "Scored dataset"
        );

        if let Some(p) = progress {
            p.finish_with_message(&format!("Scored {} records", total));
        }

        Ok(scored)
    }
}

impl Default for ParallelScorer {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

fn peer_key(record: &VisitRecord) -> PeerKey<'_> {
    (record.region_code.as_deref(), record.time_frame.as_deref())
}
