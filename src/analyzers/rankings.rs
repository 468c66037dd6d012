use crate::models::VisitRecord;
use crate::utils::constants::WEEKS_PER_MONTH;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBuilding {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub foottraffic: i64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPosition {
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVisits {
    pub day: Weekday,
    pub visits: i64,
    pub weekend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub daily_visits: Vec<DailyVisits>,
    pub weekend_average: i64,
    pub weekday_average: i64,
    pub weekend_to_weekday_ratio: f64,
    pub peak_day: Weekday,
    pub weekly_visits: i64,
    pub hourly_distribution: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRankings {
    pub id: String,
    pub name: String,
    pub overall: usize,
    pub overall_total: usize,
    pub market: MarketPosition,
    pub statistics: WeeklyStats,
}

impl BuildingRankings {
    pub fn summary(&self) -> String {
        format!(
            "Building: {} ({})\n\
            Overall Rank: #{} of {}\n\
            Market Rank: #{} of {}\n\
            Peak Day: {}\n\
            Weekly Visits: {}\n\
            Weekend/Weekday Average: {} / {} (ratio {:.2})",
            self.name,
            self.id,
            self.overall,
            self.overall_total,
            self.market.position,
            self.market.total,
            self.statistics.peak_day,
            self.statistics.weekly_visits,
            self.statistics.weekend_average,
            self.statistics.weekday_average,
            self.statistics.weekend_to_weekday_ratio,
        )
    }
}

/// Ranks buildings by foot traffic, overall and within their market
pub struct RankingAnalyzer<'a> {
    records: &'a [VisitRecord],
    overall: Vec<RankedBuilding>,
}

impl<'a> RankingAnalyzer<'a> {
    pub fn new(records: &'a [VisitRecord]) -> Self {
        Self {
            records,
            overall: overall_ranking(records),
        }
    }

    pub fn overall(&self) -> &[RankedBuilding] {
        &self.overall
    }

    /// Overall rank by name; buildings missing from the ranking take last place
    pub fn overall_rank(&self, name: &str) -> usize {
        self.overall
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.rank)
            .unwrap_or(self.overall.len())
    }

    pub fn rankings_for(&self, target: &VisitRecord) -> BuildingRankings {
        BuildingRankings {
            id: target.id.clone(),
            name: target.name.clone(),
            overall: self.overall_rank(&target.name),
            overall_total: self.overall.len(),
            market: market_position(self.records, target),
            statistics: weekly_stats(target),
        }
    }
}

/// Unique buildings by name (first occurrence wins), busiest first
pub fn overall_ranking(records: &[VisitRecord]) -> Vec<RankedBuilding> {
    let mut ranked: Vec<RankedBuilding> = dedup_by_name(records.iter())
        .into_iter()
        .map(|r| RankedBuilding {
            rank: 0,
            id: r.id.clone(),
            name: r.name.clone(),
            foottraffic: r.foottraffic_or_zero(),
            lat: r.lat,
            lng: r.lng,
        })
        .collect();

    ranked.sort_by(|a, b| b.foottraffic.cmp(&a.foottraffic));
    for (index, building) in ranked.iter_mut().enumerate() {
        building.rank = index + 1;
    }
    ranked
}

/// Position of `target` among the buildings sharing its region code
pub fn market_position(records: &[VisitRecord], target: &VisitRecord) -> MarketPosition {
    let mut market = dedup_by_name(
        records
            .iter()
            .filter(|r| r.region_code == target.region_code),
    );
    market.sort_by(|a, b| b.foottraffic_or_zero().cmp(&a.foottraffic_or_zero()));

    let total = market.len();
    let position = market
        .iter()
        .position(|r| r.name == target.name)
        .map(|i| i + 1)
        .unwrap_or(total);

    MarketPosition { position, total }
}

fn dedup_by_name<'a>(records: impl Iterator<Item = &'a VisitRecord>) -> Vec<&'a VisitRecord> {
    let mut seen = HashSet::new();
    records.filter(|r| seen.insert(r.name.as_str())).collect()
}

pub fn weekly_stats(record: &VisitRecord) -> WeeklyStats {
    let days = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    let daily_visits: Vec<DailyVisits> = days
        .iter()
        .map(|&day| DailyVisits {
            day,
            visits: record.weekday.get(day).map(|v| v.trunc() as i64).unwrap_or(0),
            weekend: matches!(day, Weekday::Sat | Weekday::Sun),
        })
        .collect();

    let sum_where = |weekend: bool| {
        daily_visits
            .iter()
            .filter(|d| d.weekend == weekend)
            .fold(0i64, |acc, d| acc.saturating_add(d.visits))
    };
    let weekend_sum = sum_where(true);
    let weekday_sum = sum_where(false);
    let weekend_average = (weekend_sum as f64 / 2.0).round() as i64;
    let weekday_average = (weekday_sum as f64 / 5.0).round() as i64;

    let weekend_to_weekday_ratio = if weekday_average != 0 {
        (weekend_average as f64 / weekday_average as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    // Sunday never counts as a peak; ties keep the earlier day
    let peak_day = daily_visits
        .iter()
        .filter(|d| d.day != Weekday::Sun)
        .fold(None::<&DailyVisits>, |best, d| match best {
            Some(b) if d.visits <= b.visits => Some(b),
            _ => Some(d),
        })
        .map(|d| d.day)
        .unwrap_or(Weekday::Mon);

    let weekly_visits = (record.foottraffic_or_zero() as f64 / WEEKS_PER_MONTH).round() as i64;
    let hourly_distribution = (0..24)
        .map(|hour| (weekly_visits as f64 * hourly_factor(hour)).round() as i64)
        .collect();

    WeeklyStats {
        daily_visits,
        weekend_average,
        weekend_to_weekday_ratio,
        weekday_average,
        peak_day,
        weekly_visits,
        hourly_distribution,
    }
}

/// Share of a week's visits expected in each hour of a business day
pub fn hourly_factor(hour: u32) -> f64 {
    match hour {
        0..=5 => 0.01,
        6..=8 => 0.02 + (hour - 6) as f64 * 0.02,
        9..=10 => 0.09,
        11..=13 => 0.07,
        14..=16 => 0.08,
        17..=19 => 0.06 - (hour - 17) as f64 * 0.015,
        _ => 0.02,
    }
}
