use crate::analyzers::vibrancy::{latest_per_building, ScoreSeries};
use crate::analyzers::{
    building_series, daily_totals, distance_distribution, hourly_profile, month_calendar,
    worker_distance_distribution, yearly_activity, ActivityFilter, DashboardFilter,
    DashboardMetrics, DatasetProfile, DateWindow, EventAnalyzer, RankingAnalyzer,
    ScoredBuilding, TenantActivityAnalyzer, VibrancyCalculator,
};
use crate::analyzers::access::{
    CategoryCount, EventStats, Heatmap, HourlyMovement, MovementShare, PropertySummary,
    TenantShare, TenantTotal, WeekdayMovement,
};
use crate::analyzers::traffic::{BuildingSeries, TrafficPoint};
use crate::cli::args::{Cli, Commands, TrafficView};
use crate::config::Settings;
use crate::error::{AnalyticsError, Result};
use crate::models::{normalize_tenant_name, VisitRecord};
use crate::processors::{IntegrityChecker, ParallelScorer};
use crate::readers::{AccessReader, VisitDataset, VisitReader};
use crate::utils::filename::{generate_default_export_filename, ExportFormat};
use crate::utils::palette::BuildingPalette;
use crate::utils::progress::ProgressReporter;
use crate::writers::{export_scores, JsonWriter, ParquetWriter};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(layout) = cli.layout {
        settings.layout = layout;
    }

    let ctx = Context {
        settings,
        json: cli.json,
    };

    match cli.command {
        Commands::Score {
            input,
            building,
            history,
            max_workers,
        } => {
            let dataset = ctx.load_visits(input)?;
            let calculator = VibrancyCalculator::with_weights(ctx.settings.weights);

            if history {
                let series: Vec<ScoreSeries> = calculator
                    .vibrancy_series(&dataset.records)
                    .into_iter()
                    .filter(|s| building.as_deref().map_or(true, |id| s.id == id))
                    .collect();
                return ctx.emit(&series, || score_history_table(&series));
            }

            if let Some(id) = building {
                let target = latest_record(&dataset.records, &id)?;
                let scored =
                    ScoredBuilding::new(target, calculator.score(target, &dataset.records));
                return ctx.emit(&scored, || score_table(std::slice::from_ref(&scored)));
            }

            let scored = ctx
                .scorer(max_workers)
                .score_all(&dataset.records, Some(&ctx.progress(dataset.records.len())))?;
            ctx.emit(&scored, || score_table(&scored))?;
        }

        Commands::Leaderboard { input, top } => {
            let dataset = ctx.load_visits(input)?;
            let palette = BuildingPalette::new(&dataset.records);
            let calculator = VibrancyCalculator::with_weights(ctx.settings.weights);

            let leaderboard = calculator.leaderboard(&dataset.records);
            let entries: Vec<LeaderboardEntry> = leaderboard
                .iter()
                .take(top)
                .enumerate()
                .map(|(i, building)| LeaderboardEntry {
                    rank: i + 1,
                    color: palette.color_for_name(&building.name),
                    building,
                })
                .collect();

            ctx.emit(&entries, || leaderboard_table(&entries))?;
        }

        Commands::Traffic {
            input,
            view,
            building,
            from,
            to,
            year,
            month,
        } => {
            let dataset = ctx.load_visits(input)?;
            let records = &dataset.records;
            let building = building.as_deref();

            match view {
                TrafficView::Daily => {
                    let (default_from, default_to) = period_bounds(records).ok_or_else(|| {
                        AnalyticsError::MissingData("no dated rows in input".to_string())
                    })?;
                    let window =
                        DateWindow::new(from.unwrap_or(default_from), to.unwrap_or(default_to))?;

                    let daily = DailyTraffic {
                        color: BuildingPalette::new(records).color_for_building(records, building),
                        points: daily_totals(records, &window, building)
                            .into_iter()
                            .map(|(date, foottraffic)| TrafficPoint { date, foottraffic })
                            .collect(),
                    };
                    ctx.emit(&daily, || {
                        format!("Color: {}\n{}", daily.color, traffic_points_table(&daily.points))
                    })?;
                }
                TrafficView::Series => {
                    let palette = BuildingPalette::new(records);
                    let series = building_series(records);
                    let colored: Vec<ColoredSeries> = series
                        .iter()
                        .filter(|s| building.map_or(true, |id| s.id == id))
                        .map(|s| ColoredSeries {
                            color: palette.color_for_name(&s.name),
                            series: s,
                        })
                        .collect();
                    ctx.emit(&colored, || series_table(&colored))?;
                }
                TrafficView::Yearly => {
                    let id = require_building(building, "yearly")?;
                    latest_record(records, id)?;

                    let years = yearly_activity(records, id);
                    ctx.emit(&years, || {
                        let mut lines = vec![format!(
                            "{:<6} {}",
                            "Year",
                            (1..=12)
                                .map(|m| format!("{:>8}", month_abbrev(m)))
                                .collect::<String>()
                        )];
                        for year in &years {
                            let cells: String = year
                                .months
                                .iter()
                                .map(|c| format!("{:>8}", c.value))
                                .collect();
                            lines.push(format!("{:<6} {}", year.year, cells));
                        }
                        lines.join("\n")
                    })?;
                }
                TrafficView::Hourly => {
                    let profiles = hourly_profile(records, building);
                    ctx.emit(&profiles, || {
                        let mut lines = Vec::new();
                        for profile in &profiles {
                            let peak = profile
                                .peak_hour()
                                .map(|h| format!("{:02}:00", h))
                                .unwrap_or_else(|| "-".to_string());
                            lines.push(format!("{} ({}), peak {}", profile.name, profile.id, peak));
                            for (hour, visitors) in profile.hours.iter().enumerate() {
                                if *visitors > 0 {
                                    lines.push(format!("  {:02}:00  {:>8}", hour, visitors));
                                }
                            }
                        }
                        lines.join("\n")
                    })?;
                }
                TrafficView::Calendar => {
                    let id = require_building(building, "calendar")?;
                    let record = latest_record(records, id)?;
                    let anchor = record.start_date;

                    let year = year.or(anchor.map(|d| d.year())).ok_or_else(|| {
                        AnalyticsError::MissingData("--year is required for undated rows".into())
                    })?;
                    let month = month.or(anchor.map(|d| d.month())).ok_or_else(|| {
                        AnalyticsError::MissingData("--month is required for undated rows".into())
                    })?;
                    if !(1..=12).contains(&month) {
                        return Err(AnalyticsError::InvalidFormat(format!(
                            "month {} is not between 1 and 12",
                            month
                        )));
                    }

                    let days = month_calendar(year, month, &record.weekday);
                    ctx.emit(&days, || {
                        days.iter()
                            .map(|d| {
                                format!(
                                    "{} {}  {:>6.1}  {:>4.0}%",
                                    d.date,
                                    d.date.weekday(),
                                    d.value,
                                    d.intensity * 100.0
                                )
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                    })?;
                }
            }
        }

        Commands::Distance {
            input,
            building,
            kind,
            workers,
        } => {
            let dataset = ctx.load_visits(input)?;
            let buckets = if workers {
                worker_distance_distribution(&dataset.records, building.as_deref())
            } else {
                distance_distribution(&dataset.records, building.as_deref(), kind)
            };

            ctx.emit(&buckets, || {
                let title = if workers {
                    "Workers by distance from home".to_string()
                } else {
                    format!("Visitors by distance from {}", kind)
                };
                let mut lines = vec![title];
                for bucket in &buckets {
                    lines.push(format!("  {:<8} {:>10}", bucket.distance, bucket.count));
                }
                lines.join("\n")
            })?;
        }

        Commands::Rankings { input, building } => {
            let dataset = ctx.load_visits(input)?;
            let target = latest_record(&dataset.records, &building)?;
            let rankings = RankingAnalyzer::new(&dataset.records).rankings_for(target);

            ctx.emit(&rankings, || {
                let hourly: Vec<String> = rankings
                    .statistics
                    .hourly_distribution
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| **v > 0)
                    .map(|(h, v)| format!("  {:02}:00  {:>8}", h, v))
                    .collect();
                format!(
                    "{}\n\nExpected Weekly Visits by Hour:\n{}",
                    rankings.summary(),
                    hourly.join("\n")
                )
            })?;
        }

        Commands::Summary {
            input,
            from,
            to,
            exclude_weekends,
        } => {
            let dataset = ctx.load_visits(input)?;
            let profile = DatasetProfile::new(&dataset.records, &dataset.headers);

            let filter = profile.date_range.map(|(start, end)| {
                DashboardFilter::new(from.unwrap_or(start), to.unwrap_or(end))
                    .with_weekends(!exclude_weekends)
            });
            let metrics = filter
                .and_then(|f| DashboardMetrics::from_records(f.apply(&dataset.records)));

            let report = SummaryReport {
                profile,
                filter,
                metrics,
                skipped_rows: dataset.skipped_rows,
            };
            ctx.emit(&report, || {
                let metrics = report
                    .metrics
                    .as_ref()
                    .map(|m| m.summary())
                    .unwrap_or_else(|| "No rows in the selected range".to_string());
                format!(
                    "{}\nSkipped Rows: {}\n\n{}",
                    report.profile.detailed_summary(),
                    report.skipped_rows,
                    metrics
                )
            })?;
        }

        Commands::Validate { input, tolerance } => {
            let dataset = ctx.load_visits(input)?;
            if dataset.skipped_rows > 0 {
                warn!(skipped = dataset.skipped_rows, "Rows skipped while loading");
            }

            let checker = IntegrityChecker::with_weekday_tolerance(
                tolerance.unwrap_or(ctx.settings.weekday_tolerance),
            );
            let report = checker.check_integrity(&dataset.records);

            ctx.emit(&report, || {
                let verdict = if report.is_clean() {
                    "All records passed integrity checks".to_string()
                } else {
                    format!("Found {} integrity issues", report.violations.len())
                };
                format!("{}\n{}", checker.generate_summary(&report), verdict)
            })?;
        }

        Commands::Tenants {
            input,
            from,
            to,
            tenant,
            property,
        } => {
            let activity = AccessReader::new().read_tenant_activity(&input)?;
            let filter = ActivityFilter {
                from,
                to,
                tenant: tenant.as_deref().map(normalize_tenant_name),
            };
            let analyzer = TenantActivityAnalyzer::new(&activity, &filter);

            let properties = match property.as_deref() {
                Some(name) => vec![analyzer.property_summary(name)],
                None => analyzer
                    .properties()
                    .iter()
                    .map(|name| analyzer.property_summary(name))
                    .collect(),
            };

            let report = TenantReport {
                rows: analyzer.row_count(),
                total_events: analyzer.total_events(),
                tenants: analyzer.totals_by_tenant(),
                hourly: analyzer.hourly_movement(),
                hourly_by_tenant: analyzer.hourly_by_tenant(),
                weekday: analyzer.weekday_movement(),
                movement_types: analyzer.movement_types(),
                categories: analyzer.category_distribution(),
                properties,
            };
            ctx.emit(&report, || tenant_report_table(&report))?;
        }

        Commands::Events { input, top } => {
            let events = AccessReader::new().read_events(&input)?;
            let analyzer = EventAnalyzer::new(&events);

            let report = EventReport {
                stats: analyzer.stats(),
                top_tenants: analyzer.top_tenants_by_building(top),
                hourly: analyzer.hourly_heatmap(),
                weekday: analyzer.weekday_heatmap(),
            };
            ctx.emit(&report, || event_report_table(&report, top))?;
        }

        Commands::Export {
            input,
            output_file,
            format,
            compression,
            max_workers,
        } => {
            let dataset = ctx.load_visits(input)?;
            let output_file =
                output_file.unwrap_or_else(|| generate_default_export_filename(format));
            let compression = compression.unwrap_or_else(|| ctx.settings.compression.clone());

            let (scored, integrity_report) = ctx
                .scorer(max_workers)
                .process(&dataset.records, Some(&ctx.progress(dataset.records.len())))?;

            if !integrity_report.is_clean() {
                warn!(
                    flagged = integrity_report.flagged_records,
                    "Exporting records with integrity issues; run `validate` for details"
                );
            }

            if scored.is_empty() {
                warn!("No records to write");
                return Ok(());
            }

            let parquet = ParquetWriter::new()
                .with_compression(&compression)?
                .with_row_group_size(ctx.settings.row_group_size);
            export_scores(&scored, format, &output_file, &parquet)?;
            info!(rows = scored.len(), path = %output_file.display(), "Export complete");

            let report = ExportReport {
                path: output_file.clone(),
                format: format.extension(),
                rows: scored.len(),
                flagged_records: integrity_report.flagged_records,
            };
            ctx.emit(&report, || {
                let mut text = format!(
                    "Wrote {} scored rows to {}",
                    report.rows,
                    report.path.display()
                );
                if format == ExportFormat::Parquet {
                    if let Ok(info) = parquet.get_file_info(&output_file) {
                        text.push_str(&format!("\n\n{}", info.summary()));
                    }
                }
                text
            })?;
        }
    }

    Ok(())
}

struct Context {
    settings: Settings,
    json: bool,
}

impl Context {
    fn load_visits(&self, input: Option<PathBuf>) -> Result<VisitDataset> {
        let path = input
            .or_else(|| self.settings.input.clone())
            .ok_or_else(|| {
                AnalyticsError::MissingData(
                    "no input file; pass --input or set `input` in settings".to_string(),
                )
            })?;
        self.read_visits(&path)
    }

    fn read_visits(&self, path: &Path) -> Result<VisitDataset> {
        let spinner =
            ProgressReporter::new_spinner(&format!("Loading {}...", path.display()), self.json);
        let dataset = VisitReader::with_layout(self.settings.layout).load(path)?;
        spinner.finish_with_message(&format!("Loaded {} records", dataset.records.len()));
        Ok(dataset)
    }

    fn scorer(&self, max_workers: Option<usize>) -> ParallelScorer {
        ParallelScorer::new(max_workers.unwrap_or(self.settings.max_workers))
            .with_weights(self.settings.weights)
            .with_weekday_tolerance(self.settings.weekday_tolerance)
    }

    /// Progress bars stay off stdout's way when printing JSON
    fn progress(&self, total: usize) -> ProgressReporter {
        ProgressReporter::new(total as u64, "Scoring buildings...", self.json)
    }

    fn emit<T, F>(&self, value: &T, table: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        if self.json {
            JsonWriter::new().write_value(value, std::io::stdout().lock())?;
            println!();
        } else {
            println!("{}", table());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct LeaderboardEntry<'a> {
    rank: usize,
    color: &'static str,
    #[serde(flatten)]
    building: &'a ScoredBuilding,
}

#[derive(Serialize)]
struct DailyTraffic {
    color: &'static str,
    points: Vec<TrafficPoint>,
}

#[derive(Serialize)]
struct ColoredSeries<'a> {
    color: &'static str,
    #[serde(flatten)]
    series: &'a BuildingSeries,
}

#[derive(Serialize)]
struct SummaryReport {
    profile: DatasetProfile,
    filter: Option<DashboardFilter>,
    metrics: Option<DashboardMetrics>,
    skipped_rows: usize,
}

#[derive(Serialize)]
struct TenantReport {
    rows: usize,
    total_events: u64,
    tenants: Vec<TenantTotal>,
    hourly: Vec<HourlyMovement>,
    hourly_by_tenant: BTreeMap<String, Vec<u64>>,
    weekday: Vec<WeekdayMovement>,
    movement_types: Vec<MovementShare>,
    categories: Vec<CategoryCount>,
    properties: Vec<PropertySummary>,
}

#[derive(Serialize)]
struct EventReport {
    stats: EventStats,
    top_tenants: BTreeMap<String, Vec<TenantShare>>,
    hourly: Heatmap,
    weekday: Heatmap,
}

#[derive(Serialize)]
struct ExportReport {
    path: PathBuf,
    format: &'static str,
    rows: usize,
    flagged_records: usize,
}

/// Most recent record of a building, the one views default to
fn latest_record<'a>(records: &'a [VisitRecord], building_id: &str) -> Result<&'a VisitRecord> {
    latest_per_building(records)
        .into_iter()
        .find(|r| r.id == building_id)
        .ok_or_else(|| AnalyticsError::BuildingNotFound {
            building_id: building_id.to_string(),
        })
}

fn require_building<'a>(building: Option<&'a str>, view: &str) -> Result<&'a str> {
    building.ok_or_else(|| {
        AnalyticsError::MissingData(format!("--building is required for the {} view", view))
    })
}

/// Earliest start and latest end date over the dataset
fn period_bounds(records: &[VisitRecord]) -> Option<(chrono::NaiveDate, chrono::NaiveDate)> {
    let start = records.iter().filter_map(|r| r.start_date).min()?;
    let end = records
        .iter()
        .filter_map(|r| r.end_date.or(r.start_date))
        .max()?;
    Some((start, end.max(start)))
}

fn month_abbrev(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS[(month as usize).saturating_sub(1) % 12]
}

fn describe_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn score_table(scores: &[ScoredBuilding]) -> String {
    let mut lines = vec![format!(
        "{:<12} {:<32} {:<10} {:>6} {:>8} {:>6} {:>7}",
        "ID", "Name", "Period", "Score", "Traffic", "Dwell", "Spread"
    )];
    for s in scores {
        let c = s.vibrancy.components;
        lines.push(format!(
            "{:<12} {:<32} {:<10} {:>6} {:>8} {:>6} {:>7}",
            s.id,
            s.name,
            describe_date(s.start_date),
            s.vibrancy.score,
            c.traffic_score,
            c.dwell_score,
            c.spread_score
        ));
    }
    lines.join("\n")
}

fn score_history_table(series: &[ScoreSeries]) -> String {
    let mut lines = Vec::new();
    for s in series {
        lines.push(format!("{} ({})", s.name, s.id));
        for point in &s.points {
            lines.push(format!("  {}  {:>3}", point.date, point.score));
        }
    }
    lines.join("\n")
}

fn leaderboard_table(entries: &[LeaderboardEntry]) -> String {
    let mut lines = vec![format!(
        "{:>4}  {:<32} {:<10} {:>6}  {}",
        "Rank", "Name", "Period", "Score", "Color"
    )];
    for e in entries {
        lines.push(format!(
            "{:>4}  {:<32} {:<10} {:>6}  {}",
            e.rank,
            e.building.name,
            describe_date(e.building.start_date),
            e.building.vibrancy.score,
            e.color
        ));
    }
    lines.join("\n")
}

fn traffic_points_table(points: &[TrafficPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{} {}  {:>10}", p.date, p.date.weekday(), p.foottraffic))
        .collect::<Vec<_>>()
        .join("\n")
}

fn series_table(series: &[ColoredSeries]) -> String {
    let mut lines = Vec::new();
    for s in series {
        lines.push(format!("{} ({}) {}", s.series.name, s.series.id, s.color));
        for point in &s.series.points {
            lines.push(format!("  {}  {:>10}", point.date, point.foottraffic));
        }
    }
    lines.join("\n")
}

fn tenant_report_table(report: &TenantReport) -> String {
    let mut lines = vec![
        format!("Rows: {}", report.rows),
        format!("Total Events: {}", report.total_events),
        String::new(),
        "Events by Tenant:".to_string(),
    ];
    for total in &report.tenants {
        lines.push(format!("  {:<32} {:>10}", total.tenant, total.total_events));
    }

    lines.push(String::new());
    lines.push("Movement Types:".to_string());
    for share in &report.movement_types {
        lines.push(format!(
            "  {:<32} {:>10} ({:.1}%)",
            share.category, share.events, share.percentage
        ));
    }

    lines.push(String::new());
    lines.push("Events by Hour (current / historical):".to_string());
    for slot in report.hourly.iter().filter(|h| h.current > 0 || h.historical > 0) {
        lines.push(format!(
            "  {:02}:00  {:>8} / {:>8}",
            slot.hour, slot.current, slot.historical
        ));
    }

    // Only hours where some tenant badged in get a column
    let active_hours: Vec<usize> = (0..24)
        .filter(|&hour| report.hourly_by_tenant.values().any(|hours| hours[hour] > 0))
        .collect();
    if !active_hours.is_empty() {
        lines.push(String::new());
        lines.push("Hourly Events by Tenant:".to_string());
        lines.push(format!(
            "  {:<24}{}",
            "",
            active_hours
                .iter()
                .map(|h| format!("{:>8}", format!("{:02}:00", h)))
                .collect::<String>()
        ));
        for (tenant, hours) in &report.hourly_by_tenant {
            lines.push(format!(
                "  {:<24}{}",
                tenant,
                active_hours
                    .iter()
                    .map(|&h| format!("{:>8}", hours[h]))
                    .collect::<String>()
            ));
        }
    }

    lines.push(String::new());
    lines.push("Events by Weekday:".to_string());
    for day in &report.weekday {
        let total = day.tenants.values().fold(0u64, |acc, v| acc.saturating_add(*v));
        lines.push(format!("  {:<4} {:>10}", day.day, total));
    }

    lines.push(String::new());
    lines.push("Reader Categories:".to_string());
    for category in &report.categories {
        lines.push(format!(
            "  {:<32} {:>10}",
            category.category, category.total_events
        ));
    }

    for property in &report.properties {
        lines.push(String::new());
        lines.push(property.summary());
    }

    lines.join("\n")
}

fn event_report_table(report: &EventReport, top: usize) -> String {
    let mut lines = vec![report.stats.detailed_summary(top), String::new()];
    lines.push("Top Tenants by Building:".to_string());
    for (building, shares) in &report.top_tenants {
        let tenants: Vec<String> = shares
            .iter()
            .map(|s| format!("{} ({})", s.tenant, s.events))
            .collect();
        lines.push(format!("  {}: {}", building, tenants.join(", ")));
    }
    lines.push(String::new());
    lines.push(heatmap_table("Events by Hour", &report.hourly));
    lines.push(String::new());
    lines.push(heatmap_table("Events by Weekday", &report.weekday));
    lines.join("\n")
}

fn heatmap_table(title: &str, heatmap: &Heatmap) -> String {
    let mut lines = vec![
        title.to_string(),
        format!(
            "  {:<24}{}",
            "",
            heatmap
                .columns
                .iter()
                .map(|c| format!("{:>8}", c))
                .collect::<String>()
        ),
    ];
    for (row, counts) in &heatmap.rows {
        lines.push(format!(
            "  {:<24}{}",
            row,
            counts.iter().map(|c| format!("{:>8}", c)).collect::<String>()
        ));
    }
    lines.push(format!(
        "  {:<24}{}",
        "Total",
        heatmap
            .column_totals()
            .iter()
            .map(|c| format!("{:>8}", c))
            .collect::<String>()
    ));
    lines.join("\n")
}
