use crate::error::{AnalyticsError, Result};
use crate::models::{VisitRecord, WeekdayVisits};
use crate::utils::constants::{
    BUSINESS_HOURS, BUSINESS_HOURS_END, BUSINESS_HOURS_START, SHOULDER_EVENING_FACTOR,
    SHOULDER_MORNING_FACTOR,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidFormat(format!(
                "window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficPoint {
    pub date: NaiveDate,
    pub foottraffic: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSeries {
    pub id: String,
    pub name: String,
    pub points: Vec<TrafficPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthCell {
    pub month: u32,
    pub value: i64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearActivity {
    pub year: i32,
    pub months: Vec<MonthCell>,
}

impl YearActivity {
    fn empty(year: i32) -> Self {
        Self {
            year,
            months: (1..=12)
                .map(|month| MonthCell {
                    month,
                    value: 0,
                    intensity: 0.0,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProfile {
    pub id: String,
    pub name: String,
    pub hours: Vec<i64>,
}

impl HourlyProfile {
    pub fn peak_hour(&self) -> Option<usize> {
        self.hours
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(hour, _)| hour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub value: f64,
    pub intensity: f64,
}

/// Spread each record's period traffic over the days of `window` using its
/// weekday percentages
pub fn daily_totals(
    records: &[VisitRecord],
    window: &DateWindow,
    building: Option<&str>,
) -> BTreeMap<NaiveDate, i64> {
    let mut totals: BTreeMap<NaiveDate, f64> = window.days().map(|d| (d, 0.0)).collect();

    for record in records
        .iter()
        .filter(|r| building.map_or(true, |id| r.id == id))
    {
        let (Some(start), Some(end)) = (record.start_date, record.end_date) else {
            continue;
        };
        let traffic = record.foottraffic_or_zero() as f64;

        for day in start.iter_days().take_while(|d| *d <= end) {
            if day > window.end {
                break;
            }
            if let Some(total) = totals.get_mut(&day) {
                let pct = record.weekday.get(day.weekday()).unwrap_or(0.0);
                *total += traffic * pct / 100.0;
            }
        }
    }

    totals
        .into_iter()
        .map(|(date, total)| (date, total.round() as i64))
        .collect()
}

/// Foot traffic per building over time, buildings ordered by id
pub fn building_series(records: &[VisitRecord]) -> Vec<BuildingSeries> {
    let mut series: BTreeMap<&str, BuildingSeries> = BTreeMap::new();

    for record in records {
        let Some(date) = record.start_date else {
            continue;
        };
        series
            .entry(record.id.as_str())
            .or_insert_with(|| BuildingSeries {
                id: record.id.clone(),
                name: record.name.clone(),
                points: Vec::new(),
            })
            .points
            .push(TrafficPoint {
                date,
                foottraffic: record.foottraffic_or_zero(),
            });
    }

    series
        .into_values()
        .map(|mut s| {
            s.points.sort_by_key(|p| p.date);
            s
        })
        .collect()
}

/// Month-by-month traffic of one building, most recent year first.
///
/// A month holds the last record starting in it; intensity is relative to
/// the building's busiest period.
pub fn yearly_activity(records: &[VisitRecord], building_id: &str) -> Vec<YearActivity> {
    let own: Vec<&VisitRecord> = records.iter().filter(|r| r.id == building_id).collect();
    let max_traffic = own
        .iter()
        .map(|r| r.foottraffic_or_zero())
        .max()
        .unwrap_or(0);

    let mut years: BTreeMap<i32, YearActivity> = BTreeMap::new();
    for record in own {
        let Some(start) = record.start_date else {
            continue;
        };
        let value = record.foottraffic_or_zero();
        let intensity = if max_traffic > 0 {
            value as f64 / max_traffic as f64
        } else {
            0.0
        };

        let year = years
            .entry(start.year())
            .or_insert_with(|| YearActivity::empty(start.year()));
        year.months[start.month0() as usize] = MonthCell {
            month: start.month(),
            value,
            intensity,
        };
    }

    years.into_values().rev().collect()
}

/// Average traffic per hour of day, assuming visits fall in business hours
/// with lighter shoulders before and after
pub fn hourly_profile(records: &[VisitRecord], building: Option<&str>) -> Vec<HourlyProfile> {
    struct Accumulator<'a> {
        name: &'a str,
        totals: [f64; 24],
        counts: [u32; 24],
    }

    let mut buildings: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| building.map_or(true, |id| r.id == id))
    {
        let per_hour = record.foottraffic_or_zero() as f64 / BUSINESS_HOURS;
        let acc = buildings
            .entry(record.id.as_str())
            .or_insert_with(|| Accumulator {
                name: &record.name,
                totals: [0.0; 24],
                counts: [0; 24],
            });

        for hour in 0..24u32 {
            let factor = match hour {
                h if (BUSINESS_HOURS_START..BUSINESS_HOURS_END).contains(&h) => 1.0,
                h if (BUSINESS_HOURS_START - 2..BUSINESS_HOURS_START).contains(&h) => {
                    SHOULDER_MORNING_FACTOR
                }
                h if (BUSINESS_HOURS_END..BUSINESS_HOURS_END + 2).contains(&h) => {
                    SHOULDER_EVENING_FACTOR
                }
                _ => continue,
            };
            acc.totals[hour as usize] += per_hour * factor;
            acc.counts[hour as usize] += 1;
        }
    }

    buildings
        .into_iter()
        .map(|(id, acc)| HourlyProfile {
            id: id.to_string(),
            name: acc.name.to_string(),
            hours: acc
                .totals
                .iter()
                .zip(acc.counts.iter())
                .map(|(total, &count)| {
                    if count > 0 {
                        (total / count as f64).round() as i64
                    } else {
                        0
                    }
                })
                .collect(),
        })
        .collect()
}

/// Day cells of one month shaded by the building's weekday pattern.
/// An invalid year/month yields no cells.
pub fn month_calendar(year: i32, month: u32, weekday: &WeekdayVisits) -> Vec<DayCell> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let max_value = weekday.values().into_iter().fold(0.0_f64, f64::max);

    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| {
            let value = weekday.get(date.weekday()).unwrap_or(0.0);
            let intensity = if max_value > 0.0 {
                value / max_value
            } else {
                0.0
            };
            DayCell {
                date,
                value,
                intensity,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitRecordBuilder;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(id: &str, month: u32, traffic: i64) -> VisitRecord {
        let start = date(2024, month, 1);
        let end = NaiveDate::from_ymd_opt(2024, month + 1, 1)
            .unwrap_or(date(2025, 1, 1))
            .pred_opt()
            .unwrap();
        VisitRecordBuilder::new(id, format!("Building {}", id))
            .period(start, end)
            .foottraffic(traffic)
            .weekday([10.0, 15.0, 15.0, 15.0, 15.0, 20.0, 10.0])
            .build()
            .unwrap()
    }

    #[test]
    fn test_daily_totals_spread_by_weekday_share() {
        let records = vec![monthly("a", 6, 1000), monthly("b", 6, 500)];
        // 2024-06-02 is a Sunday, 2024-06-07 a Friday
        let window = DateWindow::new(date(2024, 5, 30), date(2024, 6, 7)).unwrap();

        let totals = daily_totals(&records, &window, None);
        assert_eq!(totals.len(), window.days().count());
        assert_eq!(totals[&date(2024, 5, 30)], 0);
        assert_eq!(totals[&date(2024, 6, 2)], 150);
        assert_eq!(totals[&date(2024, 6, 7)], 300);

        let single = daily_totals(&records, &window, Some("b"));
        assert_eq!(single[&date(2024, 6, 7)], 100);

        let unknown = daily_totals(&records, &window, Some("zzz"));
        assert!(unknown.values().all(|v| *v == 0));
    }

    #[test]
    fn test_window_rejects_reversed_range() {
        assert!(DateWindow::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_building_series_sorted_by_date() {
        let records = vec![
            monthly("a", 3, 300),
            monthly("a", 1, 100),
            monthly("b", 2, 50),
            VisitRecord::new("a", "Building a"),
        ];

        let series = building_series(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].id, "a");
        let values: Vec<i64> = series[0].points.iter().map(|p| p.foottraffic).collect();
        assert_eq!(values, vec![100, 300]);
    }

    #[test]
    fn test_yearly_activity_intensity() {
        let mut records = vec![monthly("a", 1, 500), monthly("a", 3, 1000)];
        let mut previous = monthly("a", 12, 250);
        previous.start_date = Some(date(2023, 12, 1));
        records.push(previous);
        records.push(monthly("b", 1, 9000));

        let years = yearly_activity(&records, "a");
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2024);
        assert_eq!(years[0].months.len(), 12);
        assert_eq!(years[0].months[0].value, 500);
        assert_eq!(years[0].months[0].intensity, 0.5);
        assert_eq!(years[0].months[1].value, 0);
        assert_eq!(years[0].months[2].intensity, 1.0);
        assert_eq!(years[1].months[11].intensity, 0.25);

        assert!(yearly_activity(&records, "missing").is_empty());
    }

    #[test]
    fn test_hourly_profile_shape() {
        let records = vec![monthly("a", 1, 1000), monthly("a", 2, 2000)];
        let profiles = hourly_profile(&records, None);

        assert_eq!(profiles.len(), 1);
        let hours = &profiles[0].hours;
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[5], 0);
        assert_eq!(hours[6], 75);
        assert_eq!(hours[12], 150);
        assert_eq!(hours[19], 45);
        assert_eq!(hours[20], 0);
        assert_eq!(profiles[0].peak_hour(), Some(8));
    }

    #[test]
    fn test_month_calendar() {
        let weekday = WeekdayVisits::from_values([5.0, 10.0, 10.0, 10.0, 10.0, 20.0, 5.0]);
        let cells = month_calendar(2024, 2, &weekday);

        assert_eq!(cells.len(), 29);
        // 2024-02-02 is a Friday
        assert_eq!(cells[1].value, 20.0);
        assert_eq!(cells[1].intensity, 1.0);
        assert_eq!(cells[2].intensity, 0.25);

        assert!(month_calendar(2024, 13, &weekday).is_empty());
        let flat = month_calendar(2024, 3, &WeekdayVisits::default());
        assert!(flat.iter().all(|c| c.intensity == 0.0));
    }
}
