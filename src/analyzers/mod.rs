pub mod access;
pub mod distance;
pub mod rankings;
pub mod summary;
pub mod traffic;
pub mod vibrancy;

pub use access::{ActivityFilter, EventAnalyzer, EventStats, TenantActivityAnalyzer};
pub use distance::{distance_distribution, worker_distance_distribution, DistanceBucket, DistanceKind};
pub use rankings::{BuildingRankings, RankingAnalyzer, WeeklyStats};
pub use summary::{DashboardFilter, DashboardMetrics, DatasetProfile};
pub use traffic::{
    building_series, daily_totals, hourly_profile, month_calendar, yearly_activity, DateWindow,
};
pub use vibrancy::{ScoredBuilding, VibrancyCalculator, VibrancyScore, VibrancyWeights};
