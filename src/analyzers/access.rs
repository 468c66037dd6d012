//! Access-control analytics.
//!
//! Two inputs are supported: the pre-aggregated tenant activity export
//! (one row per tenant, property, date and hour) and raw badge events.

use crate::models::{AccessEvent, TenantActivity};
use crate::utils::constants::TENANT_BINS;
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

const WORK_WEEK: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

const FULL_WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Row selection for tenant activity; every bound is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Canonical tenant name
    pub tenant: Option<String>,
}

impl ActivityFilter {
    pub fn matches(&self, row: &TenantActivity) -> bool {
        self.from.map_or(true, |from| row.event_date >= from)
            && self.to.map_or(true, |to| row.event_date <= to)
            && self
                .tenant
                .as_deref()
                .map_or(true, |t| row.normalized_tenant() == t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantTotal {
    pub tenant: String,
    pub total_events: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyMovement {
    pub hour: u32,
    pub current: u64,
    pub historical: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayMovement {
    pub day: Weekday,
    pub tenants: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementShare {
    pub category: String,
    pub events: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub total_events: u64,
    pub by_property: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub property_name: String,
    pub total_events: u64,
    pub unique_credentials: u64,
    pub business_hours_events: u64,
}

impl PropertySummary {
    pub fn summary(&self) -> String {
        format!(
            "Property: {}\n\
            Total Events: {}\n\
            Unique Credentials: {}\n\
            Business Hours Events: {}",
            self.property_name,
            self.total_events,
            self.unique_credentials,
            self.business_hours_events,
        )
    }
}

/// Aggregations over a filtered slice of tenant activity
pub struct TenantActivityAnalyzer<'a> {
    rows: Vec<&'a TenantActivity>,
}

impl<'a> TenantActivityAnalyzer<'a> {
    pub fn new(data: &'a [TenantActivity], filter: &ActivityFilter) -> Self {
        Self {
            rows: data.iter().filter(|r| filter.matches(r)).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn total_events(&self) -> u64 {
        self.rows
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.total_events))
    }

    /// Canonical tenant names, sorted
    pub fn tenants(&self) -> Vec<String> {
        let names: HashSet<String> = self.rows.iter().map(|r| r.normalized_tenant()).collect();
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        names
    }

    /// Events per tenant, busiest first
    pub fn totals_by_tenant(&self) -> Vec<TenantTotal> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for row in &self.rows {
            let total = totals.entry(row.normalized_tenant()).or_default();
            *total = total.saturating_add(row.total_events);
        }

        let mut totals: Vec<TenantTotal> = totals
            .into_iter()
            .map(|(tenant, total_events)| TenantTotal {
                tenant,
                total_events,
            })
            .collect();
        totals.sort_by(|a, b| {
            b.total_events
                .cmp(&a.total_events)
                .then_with(|| a.tenant.cmp(&b.tenant))
        });
        totals
    }

    /// Current and historical events per hour of day, always 24 slots
    pub fn hourly_movement(&self) -> Vec<HourlyMovement> {
        let mut slots: Vec<HourlyMovement> = (0..24)
            .map(|hour| HourlyMovement {
                hour,
                current: 0,
                historical: 0,
            })
            .collect();

        for row in &self.rows {
            if let Some(slot) = slots.get_mut(row.hour_of_day as usize) {
                slot.current = slot.current.saturating_add(row.total_events);
                slot.historical = slot.historical.saturating_add(row.historical_events);
            }
        }
        slots
    }

    /// Per-tenant events for each hour of day
    pub fn hourly_by_tenant(&self) -> BTreeMap<String, Vec<u64>> {
        let mut by_tenant: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        for row in &self.rows {
            let hours = by_tenant
                .entry(row.normalized_tenant())
                .or_insert_with(|| vec![0; 24]);
            if let Some(slot) = hours.get_mut(row.hour_of_day as usize) {
                *slot = slot.saturating_add(row.total_events);
            }
        }
        by_tenant
    }

    /// Monday to Friday events per tenant; weekend rows are left out
    pub fn weekday_movement(&self) -> Vec<WeekdayMovement> {
        let tenants = self.tenants();
        let mut days: Vec<WeekdayMovement> = WORK_WEEK
            .iter()
            .map(|&day| WeekdayMovement {
                day,
                tenants: tenants.iter().map(|t| (t.clone(), 0)).collect(),
            })
            .collect();

        for row in &self.rows {
            let weekday = row.event_date.weekday();
            let Some(day) = days.iter_mut().find(|d| d.day == weekday) else {
                continue;
            };
            let total = day.tenants.entry(row.normalized_tenant()).or_default();
            *total = total.saturating_add(row.total_events);
        }
        days
    }

    /// Events per access category with their share of the total
    pub fn movement_types(&self) -> Vec<MovementShare> {
        let mut order: Vec<&str> = Vec::new();
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for row in &self.rows {
            let category = row.access_category.as_str();
            if !totals.contains_key(category) {
                order.push(category);
            }
            let total = totals.entry(category).or_default();
            *total = total.saturating_add(row.total_events);
        }

        let total = totals.values().fold(0u64, |acc, v| acc.saturating_add(*v));
        order
            .into_iter()
            .map(|category| {
                let events = totals.get(category).copied().unwrap_or(0);
                let percentage = if total > 0 {
                    events as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                MovementShare {
                    category: category.to_string(),
                    events,
                    percentage,
                }
            })
            .collect()
    }

    /// Reader categories ranked by total events, split by property
    pub fn category_distribution(&self) -> Vec<CategoryCount> {
        let mut categories: HashMap<&str, CategoryCount> = HashMap::new();
        for row in &self.rows {
            let entry = categories
                .entry(row.reader_category.as_str())
                .or_insert_with(|| CategoryCount {
                    category: row.reader_category.replace('_', " "),
                    total_events: 0,
                    by_property: BTreeMap::new(),
                });
            entry.total_events = entry.total_events.saturating_add(row.total_events);
            let by_property = entry
                .by_property
                .entry(row.property_name.clone())
                .or_default();
            *by_property = by_property.saturating_add(row.total_events);
        }

        let mut categories: Vec<CategoryCount> = categories.into_values().collect();
        categories.sort_by(|a, b| {
            b.total_events
                .cmp(&a.total_events)
                .then_with(|| a.category.cmp(&b.category))
        });
        categories
    }

    pub fn property_summary(&self, property_name: &str) -> PropertySummary {
        let rows = self.rows.iter().filter(|r| r.property_name == property_name);
        let mut summary = PropertySummary {
            property_name: property_name.to_string(),
            total_events: 0,
            unique_credentials: 0,
            business_hours_events: 0,
        };
        for row in rows {
            summary.total_events = summary.total_events.saturating_add(row.total_events);
            summary.unique_credentials =
                summary.unique_credentials.saturating_add(row.unique_credentials);
            summary.business_hours_events =
                summary.business_hours_events.saturating_add(row.business_hours_events);
        }
        summary
    }

    pub fn properties(&self) -> Vec<String> {
        let names: HashSet<&str> = self.rows.iter().map(|r| r.property_name.as_str()).collect();
        let mut names: Vec<String> = names.into_iter().map(str::to_string).collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCount {
    pub key: String,
    pub events: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantShare {
    pub tenant: String,
    pub events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub total_events: usize,
    pub unique_buildings: usize,
    pub events_per_building: Vec<EventCount>,
    pub events_per_tenant: Vec<EventCount>,
    pub events_without_tenant: usize,
    pub without_tenant_percentage: f64,
    pub tenant_distribution: Vec<EventCount>,
}

impl EventStats {
    pub fn summary(&self) -> String {
        format!(
            "Events: {} total\n\
            Buildings: {} unique\n\
            Tenants: {} unique\n\
            Without Tenant: {} ({:.2}%)",
            self.total_events,
            self.unique_buildings,
            self.events_per_tenant.len(),
            self.events_without_tenant,
            self.without_tenant_percentage,
        )
    }

    pub fn detailed_summary(&self, top: usize) -> String {
        let mut lines = vec![self.summary(), String::new(), "Top Buildings:".to_string()];
        for entry in self.events_per_building.iter().take(top) {
            lines.push(format!("  {}: {}", entry.key, entry.events));
        }
        lines.push(String::new());
        lines.push("Top Tenants:".to_string());
        for entry in self.events_per_tenant.iter().take(top) {
            let share = entry.events as f64 / self.total_events.max(1) as f64 * 100.0;
            lines.push(format!("  {}: {} ({:.2}%)", entry.key, entry.events, share));
        }
        lines.push(String::new());
        lines.push("Tenant Size Distribution:".to_string());
        for bin in &self.tenant_distribution {
            lines.push(format!("  {}: {}", bin.key, bin.events));
        }
        lines.join("\n")
    }
}

/// Building x time-slot event counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub columns: Vec<String>,
    pub rows: BTreeMap<String, Vec<usize>>,
}

impl Heatmap {
    pub fn column_totals(&self) -> Vec<usize> {
        let mut totals = vec![0; self.columns.len()];
        for counts in self.rows.values() {
            for (total, count) in totals.iter_mut().zip(counts) {
                *total += count;
            }
        }
        totals
    }
}

/// Aggregations over raw badge events
pub struct EventAnalyzer<'a> {
    events: &'a [AccessEvent],
}

impl<'a> EventAnalyzer<'a> {
    pub fn new(events: &'a [AccessEvent]) -> Self {
        Self { events }
    }

    pub fn stats(&self) -> EventStats {
        let total_events = self.events.len();
        let events_per_building = ranked_counts(self.events.iter().map(|e| e.building_id.as_str()));
        let events_per_tenant = ranked_counts(
            self.events
                .iter()
                .filter_map(|e| e.tenant.as_deref())
                .map(str::trim)
                .filter(|t| !t.is_empty()),
        );

        let events_without_tenant = self.events.iter().filter(|e| !e.has_tenant()).count();
        let without_tenant_percentage = if total_events > 0 {
            (events_without_tenant as f64 / total_events as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        EventStats {
            total_events,
            unique_buildings: events_per_building.len(),
            tenant_distribution: tenant_size_distribution(&events_per_tenant),
            events_per_building,
            events_per_tenant,
            events_without_tenant,
            without_tenant_percentage,
        }
    }

    /// Top `n` tenants of each building with their share of the building's
    /// tenant-attributed events
    pub fn top_tenants_by_building(&self, n: usize) -> BTreeMap<String, Vec<TenantShare>> {
        let mut per_building: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for event in self.events.iter().filter(|e| e.has_tenant()) {
            if let Some(tenant) = event.tenant.as_deref() {
                per_building
                    .entry(event.building_id.as_str())
                    .or_default()
                    .push(tenant.trim());
            }
        }

        per_building
            .into_iter()
            .map(|(building, tenants)| {
                let top = ranked_counts(tenants.into_iter())
                    .into_iter()
                    .take(n)
                    .map(|c| TenantShare {
                        tenant: c.key,
                        events: c.events,
                    })
                    .collect();
                (building.to_string(), top)
            })
            .collect()
    }

    /// Events per building and hour of day
    pub fn hourly_heatmap(&self) -> Heatmap {
        let columns = (0..24).map(|h| format!("{:02}:00", h)).collect();
        self.heatmap(columns, |event| {
            event.event_at_local.map(|t| t.hour() as usize)
        })
    }

    /// Events per building and day of week, Monday first
    pub fn weekday_heatmap(&self) -> Heatmap {
        let columns = FULL_WEEK.iter().map(|d| d.to_string()).collect();
        self.heatmap(columns, |event| {
            event
                .event_at_local
                .map(|t| t.weekday().num_days_from_monday() as usize)
        })
    }

    fn heatmap<F>(&self, columns: Vec<String>, slot: F) -> Heatmap
    where
        F: Fn(&AccessEvent) -> Option<usize>,
    {
        let width = columns.len();
        let mut rows: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for event in self.events {
            let Some(index) = slot(event) else {
                continue;
            };
            let counts = rows
                .entry(event.building_id.clone())
                .or_insert_with(|| vec![0; width]);
            if let Some(count) = counts.get_mut(index) {
                *count += 1;
            }
        }
        Heatmap { columns, rows }
    }
}

fn ranked_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<EventCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }

    let mut ranked: Vec<EventCount> = counts
        .into_iter()
        .map(|(key, events)| EventCount {
            key: key.to_string(),
            events,
        })
        .collect();
    ranked.sort_by(|a, b| b.events.cmp(&a.events).then_with(|| a.key.cmp(&b.key)));
    ranked
}

/// How many tenants fall into each event-count bin
fn tenant_size_distribution(per_tenant: &[EventCount]) -> Vec<EventCount> {
    let mut bins: Vec<EventCount> = TENANT_BINS
        .iter()
        .map(|(_, label)| EventCount {
            key: label.to_string(),
            events: 0,
        })
        .collect();

    for tenant in per_tenant {
        let count = tenant.events as u64;
        if let Some(index) = TENANT_BINS.iter().position(|(upper, _)| count <= *upper) {
            bins[index].events += 1;
        }
    }
    bins
}
