//! End-to-end forecasting scenarios against small hand-built snapshots.

use chrono::{DateTime, Duration, TimeZone, Utc};
use transit_delay::config::{FallbackPolicy, ForecastSettings, PredictionPolicy};
use transit_delay::db::DatasetSnapshot;
use transit_delay::models::{EventOccurrence, EventWindow, Observation, StopFilter};
use transit_delay::services::{generate_short_term, generate_weekly, predict, predict_with_fallback};
use transit_delay::PredictionError;

/// Monday 2024-01-08 08:00 UTC.
fn monday_8am() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 8, 0, 0).unwrap()
}

/// One departure per past Monday at 08:00, newest first.
fn weekly_history(stop: &str, delays: &[f64]) -> Vec<Observation> {
    delays
        .iter()
        .enumerate()
        .map(|(i, d)| Observation::new(stop, Some(0), monday_8am() - Duration::weeks(i as i64 + 1), *d))
        .collect()
}

fn snapshot(observations: Vec<Observation>) -> DatasetSnapshot {
    DatasetSnapshot::new(observations, vec![], EventWindow::default())
}

#[test]
fn test_base_only_prediction() {
    let snap = snapshot(weekly_history("U1", &[10.0, 20.0, 30.0, 40.0, 50.0]));
    let record = predict(&snap, monday_8am(), &StopFilter::any(), &PredictionPolicy::default()).unwrap();

    assert_eq!(record.base_mean, 30.0);
    assert_eq!(record.median_delay, 30.0);
    assert_eq!(record.sample_size, 5);
    assert_eq!(record.recent_sample_size, 0);
    assert_eq!(record.error_correction, 0.0);
    assert_eq!(record.adjusted_mean, 30.0);
    assert!((record.std_delay - 250f64.sqrt()).abs() < 1e-9);
    // The interval is wider than the mean, so only samples and conditions score.
    assert_eq!(record.reliability, 22.7);
}

#[test]
fn test_recent_window_shifts_prediction() {
    let mut obs = weekly_history("U1", &[10.0, 20.0, 30.0, 40.0, 50.0]);
    for (minutes_before, delay) in [(50, 40.0), (35, 45.0), (20, 45.0), (5, 50.0)] {
        obs.push(Observation::new("U1", Some(0), monday_8am() - Duration::minutes(minutes_before), delay));
    }
    let snap = snapshot(obs);
    let record = predict(&snap, monday_8am(), &StopFilter::any(), &PredictionPolicy::default()).unwrap();

    assert_eq!(record.base_mean, 30.0);
    assert_eq!(record.recent_sample_size, 4);
    assert_eq!(record.error_correction, 15.0);
    assert_eq!(record.adjusted_mean, 45.0);
    // Interval width judged against 45 s, not 30 s: 1 - 39.265/46 of the CI term survives.
    assert_eq!(record.reliability, 28.5);
}

#[test]
fn test_departure_at_target_is_not_recent() {
    let mut obs = weekly_history("U1", &[10.0, 20.0, 30.0, 40.0, 50.0]);
    for minutes_before in [30, 20] {
        obs.push(Observation::new("U1", Some(0), monday_8am() - Duration::minutes(minutes_before), 100.0));
    }
    // At the target instant: outside the half-open window.
    obs.push(Observation::new("U1", Some(0), monday_8am(), 100.0));
    let snap = snapshot(obs);
    let record = predict(&snap, monday_8am(), &StopFilter::any(), &PredictionPolicy::default()).unwrap();

    assert_eq!(record.recent_sample_size, 2);
    assert_eq!(record.error_correction, 0.0);
}

#[test]
fn test_two_samples_is_insufficient() {
    let snap = snapshot(weekly_history("U1", &[10.0, 20.0]));
    let err = predict(&snap, monday_8am(), &StopFilter::any(), &PredictionPolicy::default()).unwrap_err();
    assert_eq!(err, PredictionError::InsufficientData { found: 2, required: 5 });
}

#[test]
fn test_identical_delays_have_zero_margin() {
    let snap = snapshot(weekly_history("U1", &[42.0; 6]));
    let record = predict(&snap, monday_8am(), &StopFilter::any(), &PredictionPolicy::default()).unwrap();
    assert_eq!(record.std_delay, 0.0);
    assert_eq!(record.margin_of_error, 0.0);
    assert_eq!(record.confidence_lower, 42.0);
    assert_eq!(record.confidence_upper, 42.0);
}

#[test]
fn test_interval_is_symmetric() {
    let snap = snapshot(weekly_history("U1", &[3.0, 90.0, 14.0, 55.0, 27.0, 61.0, 8.0]));
    let record = predict(&snap, monday_8am(), &StopFilter::any(), &PredictionPolicy::default()).unwrap();
    let upper = record.confidence_upper - record.base_mean;
    let lower = record.base_mean - record.confidence_lower;
    assert!((upper - lower).abs() < 1e-9);
    assert!(record.margin_of_error > 0.0);
}

#[test]
fn test_stop_filter_selects_subset() {
    let mut obs = weekly_history("U1", &[10.0; 5]);
    obs.extend(weekly_history("U2", &[100.0; 5]));
    let snap = snapshot(obs);
    let policy = PredictionPolicy::default();

    let u1 = predict(&snap, monday_8am(), &StopFilter::new(Some("U1".into()), None), &policy).unwrap();
    let u2 = predict(&snap, monday_8am(), &StopFilter::new(Some("U2".into()), Some(0)), &policy).unwrap();
    let all = predict(&snap, monday_8am(), &StopFilter::any(), &policy).unwrap();

    assert_eq!(u1.base_mean, 10.0);
    assert_eq!(u2.base_mean, 100.0);
    assert_eq!(all.sample_size, 10);
    assert_eq!(all.base_mean, 55.0);
}

#[test]
fn test_relax_filters_falls_back_to_network() {
    let snap = snapshot(weekly_history("U1", &[10.0, 20.0, 30.0, 40.0, 50.0]));
    let filter = StopFilter::new(Some("U9".into()), Some(1));

    let strict = PredictionPolicy::default();
    assert!(predict_with_fallback(&snap, monday_8am(), &filter, &strict)
        .unwrap_err()
        .is_insufficient_data());

    let relaxed = PredictionPolicy {
        fallback: FallbackPolicy::RelaxFilters,
        ..PredictionPolicy::default()
    };
    let record = predict_with_fallback(&snap, monday_8am(), &filter, &relaxed).unwrap();
    assert!(record.filters_relaxed);
    assert_eq!(record.stop_id.as_deref(), Some("U9"));
    assert_eq!(record.direction, Some(1));
    assert_eq!(record.base_mean, 30.0);
}

#[test]
fn test_event_day_lowers_reliability() {
    let history = weekly_history("U1", &[30.0; 8]);
    let plain = snapshot(history.clone());
    let with_event = DatasetSnapshot::new(
        history,
        vec![EventOccurrence::new(monday_8am() + Duration::hours(10))],
        EventWindow::default(),
    );
    let policy = PredictionPolicy::default();

    let a = predict(&plain, monday_8am(), &StopFilter::any(), &policy).unwrap();
    let b = predict(&with_event, monday_8am(), &StopFilter::any(), &policy).unwrap();
    assert!(!a.is_event_day);
    assert!(b.is_event_day);
    assert!(b.reliability < a.reliability);
    assert_eq!(a.base_mean, b.base_mean);
}

#[test]
fn test_short_term_steps_and_skips() {
    // History only covers the 08:00 hour; later steps are skipped.
    let snap = snapshot(weekly_history("U1", &[10.0, 20.0, 30.0, 40.0, 50.0]));
    let batch = generate_short_term(
        &snap,
        monday_8am(),
        &StopFilter::any(),
        &PredictionPolicy::default(),
        &ForecastSettings::default(),
    )
    .unwrap();

    // 08:00 only; 08:15..08:45 fall in the same hour slot too.
    assert_eq!(batch.len(), 4);
    assert_eq!(batch.skipped.len(), 8);
    assert!(batch.is_sorted());
    assert_eq!(batch.records[0].target_datetime, monday_8am());
    assert_eq!(batch.records[3].target_datetime, monday_8am() + Duration::minutes(45));
}

#[test]
fn test_weekly_starts_on_the_hour() {
    let snap = snapshot(weekly_history("U1", &[10.0, 20.0, 30.0, 40.0, 50.0]));
    let start = monday_8am() + Duration::minutes(37);
    let batch = generate_weekly(&snap, start, &StopFilter::any(), 60, 0.0, &PredictionPolicy::default()).unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch.records[0].target_datetime, monday_8am());
    assert_eq!(batch.skipped.len(), 167);
}

#[test]
fn test_weekly_rejects_bad_parameters() {
    let snap = snapshot(vec![]);
    let policy = PredictionPolicy::default();
    assert!(matches!(
        generate_weekly(&snap, monday_8am(), &StopFilter::any(), -15, 0.0, &policy),
        Err(PredictionError::InvalidInput(_))
    ));
    assert!(matches!(
        generate_weekly(&snap, monday_8am(), &StopFilter::any(), 15, f64::NAN, &policy),
        Err(PredictionError::InvalidInput(_))
    ));
}
