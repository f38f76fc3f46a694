use super::*;
use crate::models::{EventOccurrence, EventWindow, Observation};
use chrono::TimeZone;

/// Monday 2024-01-08 00:00 UTC.
fn week_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()
}

/// Six weeks of departures every 15 minutes before `week_start`, with a
/// constant delay per hour of day (`2 * hour` seconds).
fn six_weeks(stop: &str) -> Vec<Observation> {
    let first = week_start() - Duration::weeks(6);
    let mut obs = Vec::new();
    let mut t = first;
    while t < week_start() {
        obs.push(Observation::new(stop, Some(0), t, 2.0 * hour_of_day(&t) as f64));
        t += Duration::minutes(15);
    }
    obs
}

fn snapshot_with_events(events: Vec<EventOccurrence>) -> DatasetSnapshot {
    DatasetSnapshot::new(six_weeks("U1"), events, EventWindow::default())
}

fn u1() -> StopFilter {
    StopFilter::new(Some("U1".into()), Some(0))
}

#[test]
fn test_predict_fills_calendar_fields() {
    let snap = snapshot_with_events(vec![]);
    let target = week_start() + Duration::hours(8);
    let record = predict(&snap, target, &u1(), &PredictionPolicy::default()).unwrap();

    assert_eq!(record.target_datetime, target);
    assert_eq!(record.stop_id.as_deref(), Some("U1"));
    assert_eq!(record.sample_size, 24);
    assert_eq!(record.base_mean, 16.0);
    assert_eq!(record.adjusted_mean, record.base_mean + record.error_correction);
    assert!(record.is_peak_hour);
    assert!(!record.is_event_day);
    assert!(!record.is_weekend);
    assert_eq!(record.day_name, "Monday");
    assert_eq!(record.time_period, TimePeriod::MorningPeak);
    assert!(!record.filters_relaxed);
    // 100 * (0.4 * 24/30 + 0.4 * 1 + 0.2 * 0.8)
    assert_eq!(record.reliability, 88.0);
}

#[test]
fn test_predict_marks_event_days() {
    let event = EventOccurrence::new(week_start() + Duration::hours(18));
    let snap = snapshot_with_events(vec![event]);
    let record = predict(&snap, week_start() + Duration::hours(12), &u1(), &PredictionPolicy::default())
        .unwrap();
    assert!(record.is_event_day);
    assert!(!record.is_peak_hour);
    // 100 * (0.32 + 0.4 + 0.2 * 0.9)
    assert_eq!(record.reliability, 90.0);
}

#[test]
fn test_predict_surfaces_insufficient_data() {
    let snap = snapshot_with_events(vec![]);
    let err = predict(
        &snap,
        week_start() + Duration::hours(8),
        &StopFilter::new(Some("U9".into()), None),
        &PredictionPolicy::default(),
    )
    .unwrap_err();
    assert!(err.is_insufficient_data());
}

#[test]
fn test_short_term_has_twelve_ordered_steps() {
    let snap = snapshot_with_events(vec![]);
    let start = week_start() + Duration::hours(8);
    let batch = generate_short_term(
        &snap,
        start,
        &u1(),
        &PredictionPolicy::default(),
        &ForecastSettings::default(),
    )
    .unwrap();

    assert_eq!(batch.mode, ForecastMode::ShortTerm);
    assert_eq!(batch.len(), 12);
    assert!(batch.skipped.is_empty());
    assert!(batch.is_sorted());
    assert_eq!(batch.records[0].target_datetime, start);
    for (i, record) in batch.records.iter().enumerate() {
        assert_eq!(record.target_datetime, start + Duration::minutes(15 * i as i64));
    }
}

#[test]
fn test_strict_policy_lists_skipped_steps() {
    let snap = snapshot_with_events(vec![]);
    let start = week_start() + Duration::hours(8);
    let batch = generate_short_term(
        &snap,
        start,
        &StopFilter::new(Some("U2".into()), None),
        &PredictionPolicy::default(),
        &ForecastSettings::default(),
    )
    .unwrap();

    assert!(batch.is_empty());
    assert_eq!(batch.skipped.len(), 12);
    assert_eq!(batch.skipped[0], start);
    assert!(batch.skipped.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_relax_filters_policy_retries_without_constraints() {
    let snap = snapshot_with_events(vec![]);
    let policy = PredictionPolicy {
        fallback: FallbackPolicy::RelaxFilters,
        ..Default::default()
    };
    let batch = generate_short_term(
        &snap,
        week_start() + Duration::hours(8),
        &StopFilter::new(Some("U2".into()), Some(1)),
        &policy,
        &ForecastSettings::default(),
    )
    .unwrap();

    assert_eq!(batch.len(), 12);
    assert!(batch.skipped.is_empty());
    for record in &batch.records {
        assert!(record.filters_relaxed);
        assert_eq!(record.stop_id.as_deref(), Some("U2"));
        assert_eq!(record.direction, Some(1));
        assert_eq!(record.sample_size, 24);
    }
}

#[test]
fn test_relax_filters_does_not_touch_satisfied_steps() {
    let snap = snapshot_with_events(vec![]);
    let policy = PredictionPolicy {
        fallback: FallbackPolicy::RelaxFilters,
        ..Default::default()
    };
    let record = predict_with_fallback(&snap, week_start() + Duration::hours(3), &u1(), &policy).unwrap();
    assert!(!record.filters_relaxed);
}

#[test]
fn test_weekly_covers_seven_days_from_truncated_start() {
    let snap = snapshot_with_events(vec![]);
    let start = week_start() + Duration::hours(8) + Duration::minutes(37);
    let batch = generate_weekly(&snap, start, &u1(), 60, 0.0, &PredictionPolicy::default()).unwrap();

    assert_eq!(batch.mode, ForecastMode::Weekly);
    assert_eq!(batch.len(), 7 * 24);
    assert!(batch.is_sorted());
    assert_eq!(batch.records[0].target_datetime, week_start() + Duration::hours(8));
    assert_eq!(
        batch.records.last().unwrap().target_datetime,
        week_start() + Duration::days(7) + Duration::hours(7)
    );
}

#[test]
fn test_weekly_min_reliability_drops_peak_hours() {
    let snap = snapshot_with_events(vec![]);
    // Off-peak steps score 92.0, peak steps 88.0
    let batch = generate_weekly(&snap, week_start(), &u1(), 60, 90.0, &PredictionPolicy::default()).unwrap();

    assert_eq!(batch.len(), 7 * 18);
    assert!(batch.records.iter().all(|r| r.reliability >= 90.0));
    assert!(batch.records.iter().all(|r| !r.is_peak_hour));
    assert!(batch.is_sorted());
    assert!(batch.skipped.is_empty());
}

#[test]
fn test_weekly_threshold_above_everything_yields_empty_batch() {
    let snap = snapshot_with_events(vec![]);
    let batch = generate_weekly(&snap, week_start(), &u1(), 15, 100.5, &PredictionPolicy::default()).unwrap();
    assert!(batch.is_empty());
    assert!(batch.skipped.is_empty());
}

#[test]
fn test_weekly_rejects_non_positive_interval() {
    let snap = snapshot_with_events(vec![]);
    let err = generate_weekly(&snap, week_start(), &u1(), 0, 0.0, &PredictionPolicy::default()).unwrap_err();
    assert!(matches!(err, PredictionError::InvalidInput(_)));
}

#[test]
fn test_weekly_rejects_intervals_longer_than_the_span() {
    let snap = snapshot_with_events(vec![]);
    for interval in [7 * 24 * 60 + 1, 1_000_000_000_000, i64::MAX] {
        let err = generate_weekly(&snap, week_start(), &u1(), interval, 0.0, &PredictionPolicy::default())
            .unwrap_err();
        assert!(matches!(err, PredictionError::InvalidInput(_)));
    }

    let single = generate_weekly(&snap, week_start(), &u1(), 7 * 24 * 60, 0.0, &PredictionPolicy::default())
        .unwrap();
    assert_eq!(single.len(), 1);
}

#[test]
fn test_weekly_near_the_end_of_time_is_invalid_input() {
    let snap = snapshot_with_events(vec![]);
    let err = generate_weekly(&snap, DateTime::<Utc>::MAX_UTC, &u1(), 60, 0.0, &PredictionPolicy::default())
        .unwrap_err();
    assert!(matches!(err, PredictionError::InvalidInput(_)));
}

#[test]
fn test_step_targets_stop_at_the_representable_range() {
    let end = DateTime::<Utc>::MAX_UTC;
    let start = end - Duration::minutes(30);
    let targets = step_targets(start, end, 20).unwrap();
    assert_eq!(targets, vec![start, start + Duration::minutes(20)]);

    assert!(step_targets(start, end, i64::MAX).is_err());
    assert!(step_targets(start, end, 0).is_err());
}

#[test]
fn test_short_term_rejects_bad_settings() {
    let snap = snapshot_with_events(vec![]);
    let settings = ForecastSettings {
        short_term_interval_minutes: -15,
        ..Default::default()
    };
    let err = generate_short_term(&snap, week_start(), &u1(), &PredictionPolicy::default(), &settings)
        .unwrap_err();
    assert!(matches!(err, PredictionError::InvalidInput(_)));
}

#[test]
fn test_empty_snapshot_skips_every_step() {
    let snap = DatasetSnapshot::empty();
    let batch = generate_weekly(&snap, week_start(), &StopFilter::any(), 120, 0.0, &PredictionPolicy::default())
        .unwrap();
    assert!(batch.is_empty());
    assert_eq!(batch.skipped.len(), 7 * 12);
}

#[test]
fn test_only_insufficient_data_is_skipped() {
    let snap = snapshot_with_events(vec![]);
    let start = week_start() + Duration::hours(8);
    let policy = PredictionPolicy {
        recent_window_minutes: i64::MAX,
        ..Default::default()
    };

    // Every step reaches the correction window and fails there.
    let err = generate_short_term(&snap, start, &u1(), &policy, &ForecastSettings::default()).unwrap_err();
    assert!(matches!(err, PredictionError::InvalidInput(_)));

    // Steps that already lack history never get that far.
    let batch = generate_short_term(
        &snap,
        start,
        &StopFilter::new(Some("U9".into()), None),
        &policy,
        &ForecastSettings::default(),
    )
    .unwrap();
    assert!(batch.is_empty());
    assert_eq!(batch.skipped.len(), 12);
}
