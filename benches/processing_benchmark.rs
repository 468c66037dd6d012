use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use footfall_analytics::analyzers::{
    daily_totals, hourly_profile, DateWindow, VibrancyCalculator,
};
use footfall_analytics::models::{VisitRecord, VisitRecordBuilder};
use footfall_analytics::processors::{IntegrityChecker, ParallelScorer};

const REGIONS: [&str; 4] = ["IL", "NY", "ON", "CA"];

// Create test data for benchmarking: one record per building and month
fn create_test_visits(building_count: usize, months: u32) -> Vec<VisitRecord> {
    let mut records = Vec::with_capacity(building_count * months as usize);

    for building in 0..building_count {
        let region = REGIONS[building % REGIONS.len()];
        for month in 1..=months {
            let start = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
            let end = NaiveDate::from_ymd_opt(2024, month, 28).unwrap();
            let traffic = 1_000 + (building as i64 * 37 + month as i64 * 11) % 5_000;

            let record = VisitRecordBuilder::new(
                format!("b{}", building),
                format!("Test Building {}", building),
            )
            .region(region, region)
            .time_frame("monthly")
            .coordinates(41.0 + building as f64 * 0.001, -87.0)
            .period(start, end)
            .foottraffic(traffic)
            .duration("60_90")
            .weekday([8.0, 16.0, 17.0, 18.0, 17.0, 15.0, 9.0])
            .dwell([120, 200, 90, 60, 40, 20, 10, 5])
            .build()
            .unwrap();
            records.push(record);
        }
    }

    records
}

fn benchmark_vibrancy_score(c: &mut Criterion) {
    let records = create_test_visits(200, 1);
    let calculator = VibrancyCalculator::new();

    c.bench_function("vibrancy_score", |b| {
        b.iter(|| {
            let total: u32 = records
                .iter()
                .map(|r| calculator.score(r, &records).score as u32)
                .sum();
            black_box(total)
        })
    });
}

fn benchmark_leaderboard(c: &mut Criterion) {
    let records = create_test_visits(100, 12);
    let calculator = VibrancyCalculator::new();

    c.bench_function("leaderboard", |b| {
        b.iter(|| black_box(calculator.leaderboard(&records).len()))
    });
}

fn benchmark_aggregations(c: &mut Criterion) {
    let records = create_test_visits(50, 12);
    let window = DateWindow::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
    .unwrap();

    c.bench_function("daily_totals", |b| {
        b.iter(|| black_box(daily_totals(&records, &window, None).len()))
    });

    c.bench_function("hourly_profile", |b| {
        b.iter(|| black_box(hourly_profile(&records, None).len()))
    });
}

fn benchmark_integrity_checker(c: &mut Criterion) {
    let records = create_test_visits(100, 12);

    c.bench_function("integrity_checker", |b| {
        b.iter(|| {
            let checker = IntegrityChecker::new();
            black_box(checker.check_integrity(&records).flagged_records)
        })
    });
}

fn benchmark_parallel_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_scoring_by_size");

    for &size in &[10, 50, 100, 500] {
        group.bench_with_input(
            BenchmarkId::new("buildings", size),
            &size,
            |b, &building_count| {
                let records = create_test_visits(building_count, 12);
                let scorer = ParallelScorer::default();

                b.iter(|| black_box(scorer.score_all(&records, None).map(|s| s.len())))
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_vibrancy_score,
    benchmark_leaderboard,
    benchmark_aggregations,
    benchmark_integrity_checker,
    benchmark_parallel_scoring
);
criterion_main!(benches);
