use chrono::NaiveDate;
use footfall_analytics::analyzers::{
    daily_totals, ActivityFilter, DateWindow, EventAnalyzer, RankingAnalyzer,
    TenantActivityAnalyzer, VibrancyCalculator,
};
use footfall_analytics::processors::{ParallelScorer, ViolationType};
use footfall_analytics::readers::{AccessReader, VisitReader};
use footfall_analytics::utils::ExportFormat;
use footfall_analytics::writers::{export_scores, ParquetWriter};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const VISITS_CSV: &str = "\
id,name,region_code,region_name,time_frame,lat,lng,start_date,end_date,foottraffic,visit_duration_segmentation,visits_by_day_of_week_sunday,visits_by_day_of_week_monday,visits_by_day_of_week_tuesday,visits_by_day_of_week_wednesday,visits_by_day_of_week_thursday,visits_by_day_of_week_friday,visits_by_day_of_week_saturday
b1,Alpha,IL,Illinois,monthly,41.88,-87.63,2024-01-01,2024-01-31,1000,60_90,10,10,10,10,10,10,10
b2,Beta,IL,Illinois,monthly,41.89,-87.62,2024-01-01,2024-01-31,500,30_45,10,10,10,10,10,10,10
b3,Gamma,NY,New York,monthly,40.71,-74.00,2024-01-01,2024-01-31,800,45_60,10,10,10,10,10,10,10
";

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

#[test]
fn test_score_and_export_pipeline() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input = write_fixture(&temp_dir, "visits.csv", VISITS_CSV);

    let dataset = VisitReader::new().load(&input).unwrap();
    assert_eq!(dataset.records.len(), 3);

    let (scored, report) = ParallelScorer::new(2)
        .process(&dataset.records, None)
        .unwrap();
    // Raw weekday counts summing to 70 look like drifting percentages; reported, still scored
    assert_eq!(report.count_of(ViolationType::WeekdayDrift), 3);
    assert_eq!(scored.len(), 3);

    // Beta has half of Alpha's traffic, no dwell data and a perfectly even week
    let beta = &scored[1];
    assert_eq!(beta.vibrancy.components.traffic_score, 50);
    assert_eq!(beta.vibrancy.components.dwell_score, 0);
    assert_eq!(beta.vibrancy.components.spread_score, 100);
    assert_eq!(beta.vibrancy.score, 50);

    // Gamma is alone in its region
    assert_eq!(scored[2].vibrancy.components.traffic_score, 100);

    let output = temp_dir.path().join("out").join("scores.parquet");
    let writer = ParquetWriter::new();
    export_scores(&scored, ExportFormat::Parquet, &output, &writer).unwrap();

    assert_eq!(writer.read_scores(&output).unwrap(), scored);
    assert_eq!(writer.get_file_info(&output).unwrap().total_rows, 3);

    let csv_output = temp_dir.path().join("scores.csv");
    export_scores(&scored, ExportFormat::Csv, &csv_output, &writer).unwrap();
    let csv_text = fs::read_to_string(&csv_output).unwrap();
    assert_eq!(csv_text.lines().count(), 4);
    assert!(csv_text.contains("b2,Beta,IL,2024-01-01,500,50,50,0,100"));
}

#[test]
fn test_leaderboard_and_rankings() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input = write_fixture(&temp_dir, "visits.csv", VISITS_CSV);
    let records = VisitReader::new().read_visits(&input).unwrap();

    let leaderboard = VibrancyCalculator::new().leaderboard(&records);
    let names: Vec<&str> = leaderboard.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Gamma", "Beta"]);

    let rankings = RankingAnalyzer::new(&records).rankings_for(&records[1]);
    assert_eq!(rankings.overall, 3);
    assert_eq!(rankings.market.position, 2);
    assert_eq!(rankings.market.total, 2);
}

#[test]
fn test_daily_totals_from_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input = write_fixture(&temp_dir, "visits.csv", VISITS_CSV);
    let records = VisitReader::new().read_visits(&input).unwrap();

    let window = DateWindow::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
    )
    .unwrap();
    let totals = daily_totals(&records, &window, Some("b1"));

    assert_eq!(totals.len(), 7);
    assert!(totals.values().all(|v| *v == 100));
}

#[test]
fn test_access_exports() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let activity = write_fixture(
        &temp_dir,
        "activity.json",
        r#"[
            {"tenant": "Acme", "PropertyName": "Tower One", "event_date": "2024-03-04",
             "hour_of_day": 9, "reader_category": "main_entrance", "access_category": "Entry",
             "total_events": 40, "unique_credentials": 12, "business_hours_events": 40,
             "weekend_events": 0, "historical_events": 35},
            {"tenant": "Globex", "PropertyName": "Tower One", "event_date": "2024-03-09",
             "hour_of_day": 14, "reader_category": "elevator", "access_category": "Exit",
             "total_events": 10, "unique_credentials": 4, "business_hours_events": 10,
             "weekend_events": 10, "historical_events": 8}
        ]"#,
    );

    let rows = AccessReader::new().read_tenant_activity(&activity).unwrap();
    let analyzer = TenantActivityAnalyzer::new(&rows, &ActivityFilter::default());
    assert_eq!(analyzer.total_events(), 50);
    assert_eq!(analyzer.hourly_movement()[9].current, 40);

    let summary = analyzer.property_summary("Tower One");
    assert_eq!(summary.unique_credentials, 16);

    let events = write_fixture(
        &temp_dir,
        "events.csv",
        "building_id,tenant,event_at_local\n\
         t1,Acme,2024-03-04 09:15:00\n\
         t1,,2024-03-04 10:00:00\n\
         t2,Globex,2024-03-05 14:30:00\n",
    );

    let events = AccessReader::new().read_events(&events).unwrap();
    let stats = EventAnalyzer::new(&events).stats();
    assert_eq!(stats.total_events, 3);
    assert_eq!(stats.unique_buildings, 2);
    assert_eq!(stats.events_without_tenant, 1);
}
