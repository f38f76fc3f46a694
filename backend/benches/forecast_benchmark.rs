use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use transit_delay::config::{ForecastSettings, PredictionPolicy};
use transit_delay::db::DatasetSnapshot;
use transit_delay::models::{EventWindow, Observation, StopFilter};
use transit_delay::services::{generate_short_term, generate_weekly, predict};

fn week_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()
}

/// `weeks` of departures every 5 minutes across ten stops.
fn synthetic_snapshot(weeks: i64) -> DatasetSnapshot {
    let first = week_start() - Duration::weeks(weeks);
    let mut observations = Vec::new();
    let mut t = first;
    let mut i = 0u64;
    while t < week_start() {
        let stop = format!("S{}", i % 10);
        let delay = ((i * 37) % 240) as f64 - 30.0;
        observations.push(Observation::new(stop, Some((i % 2) as i32), t, delay));
        t += Duration::minutes(5);
        i += 1;
    }
    DatasetSnapshot::new(observations, vec![], EventWindow::default())
}

fn bench_single_prediction(c: &mut Criterion) {
    let snapshot = synthetic_snapshot(12);
    let policy = PredictionPolicy::default();
    let target = week_start() + Duration::hours(8);
    let filter = StopFilter::new(Some("S3".into()), None);

    c.bench_function("predict_single", |b| {
        b.iter(|| predict(black_box(&snapshot), black_box(target), &filter, &policy))
    });
}

fn bench_weekly(c: &mut Criterion) {
    let mut group = c.benchmark_group("weekly_forecast");
    let snapshot = synthetic_snapshot(12);
    let policy = PredictionPolicy::default();

    for interval in [60i64, 15] {
        group.bench_with_input(BenchmarkId::new("interval_minutes", interval), &interval, |b, &interval| {
            b.iter(|| {
                generate_weekly(
                    black_box(&snapshot),
                    week_start(),
                    &StopFilter::any(),
                    interval,
                    50.0,
                    &policy,
                )
            })
        });
    }

    group.finish();
}

fn bench_short_term(c: &mut Criterion) {
    let snapshot = synthetic_snapshot(12);
    let policy = PredictionPolicy::default();
    let settings = ForecastSettings::default();

    c.bench_function("short_term_forecast", |b| {
        b.iter(|| {
            generate_short_term(
                black_box(&snapshot),
                week_start() + Duration::hours(7),
                &StopFilter::any(),
                &policy,
                &settings,
            )
        })
    });
}

criterion_group!(benches, bench_single_prediction, bench_weekly, bench_short_term);
criterion_main!(benches);
