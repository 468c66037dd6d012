pub mod integrity_checker;
pub mod parallel_scorer;

pub use integrity_checker::{
    BuildingStatistics, IntegrityChecker, IntegrityReport, IntegrityViolation, ViolationType,
};
pub use parallel_scorer::ParallelScorer;
