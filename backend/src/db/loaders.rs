//! File loaders for observations and event schedules.
//!
//! Rows that cannot be interpreted (unparsable timestamp, missing or
//! non-finite delay, malformed record) are dropped and counted rather than
//! failing the whole file. Missing files, unreadable input and missing
//! required columns are errors.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{parse_timestamp, EventOccurrence, Observation};

pub const REQUIRED_OBSERVATION_COLUMNS: [&str; 4] =
    ["stop_id", "direction", "departure_timestamp", "delay_seconds"];

const EVENT_DATE_FORMAT: &str = "%d.%m.%Y";
const EVENT_TIME_FORMAT: &str = "%H:%M";
const UNKNOWN_OPPONENT: &str = "TBD";

/// Records kept from a file plus the number of rows that were dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub dropped: usize,
}

impl<T> Loaded<T> {
    fn log_dropped(&self, what: &str, source: &str) {
        if self.dropped > 0 {
            log::warn!(
                "Dropped {} malformed {} rows from {} ({} kept)",
                self.dropped,
                what,
                source,
                self.records.len()
            );
        }
    }
}

/// Observation row as it appears in CSV or JSON input, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub stop_id: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub direction: Option<i32>,
    #[serde(default)]
    pub departure_timestamp: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub delay_seconds: Option<f64>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub stop_sequence: Option<u32>,
    #[serde(default)]
    pub stop_name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl RawObservation {
    /// Validate into an [`Observation`], or `None` if the row is unusable.
    pub fn into_observation(self) -> Option<Observation> {
        let stop_id = self.stop_id.trim();
        if stop_id.is_empty() {
            return None;
        }
        let departure_timestamp = parse_timestamp(&self.departure_timestamp)?;
        let delay_seconds = self.delay_seconds.filter(|d| d.is_finite())?;

        Some(Observation {
            stop_id: stop_id.to_string(),
            direction: self.direction,
            departure_timestamp,
            delay_seconds,
            route: non_empty(self.route),
            trip_id: non_empty(self.trip_id),
            stop_sequence: self.stop_sequence,
            stop_name: non_empty(self.stop_name),
        })
    }
}

/// Validate raw rows, counting the ones that had to be dropped.
pub fn validate_observations(rows: impl IntoIterator<Item = RawObservation>) -> Loaded<Observation> {
    let mut records = Vec::new();
    let mut dropped = 0;
    for row in rows {
        match row.into_observation() {
            Some(obs) => records.push(obs),
            None => dropped += 1,
        }
    }
    Loaded { records, dropped }
}

fn io_error(operation: &str, entity: &str, path: &Path, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::io_with_context(
        format!("Failed to open {}: {}", path.display(), err),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_details(path.display().to_string()),
    )
}

fn parse_error(operation: &str, entity: &str, message: impl Into<String>) -> RepositoryError {
    RepositoryError::parse_with_context(message, ErrorContext::new(operation).with_entity(entity))
}

/// Parse observations from CSV with a header row.
pub fn parse_observations_csv<R: Read>(reader: R) -> RepositoryResult<Loaded<Observation>> {
    const OP: &str = "parse_observations_csv";
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| parse_error(OP, "observations", format!("Failed to read CSV header: {}", e)))?
        .clone();
    if let Some(missing) = REQUIRED_OBSERVATION_COLUMNS
        .iter()
        .find(|col| !headers.iter().any(|h| h == **col))
    {
        return Err(parse_error(
            OP,
            "observations",
            format!("Missing required column '{}'", missing),
        ));
    }

    let mut rows = Vec::new();
    let mut malformed = 0;
    for result in reader.deserialize::<RawObservation>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) if e.is_io_error() => {
                return Err(RepositoryError::io_with_context(
                    format!("Failed to read CSV: {}", e),
                    ErrorContext::new(OP).with_entity("observations"),
                ))
            }
            Err(_) => malformed += 1,
        }
    }

    let mut loaded = validate_observations(rows);
    loaded.dropped += malformed;
    Ok(loaded)
}

/// Parse observations from a JSON array.
pub fn parse_observations_json(content: &str) -> RepositoryResult<Loaded<Observation>> {
    let rows: Vec<RawObservation> = serde_json::from_str(content).map_err(|e| {
        parse_error(
            "parse_observations_json",
            "observations",
            format!("Invalid observation JSON: {}", e),
        )
    })?;
    Ok(validate_observations(rows))
}

/// Load observations from `path`; `.json` files are read as JSON, anything
/// else as CSV.
pub fn load_observations(path: &Path) -> RepositoryResult<Loaded<Observation>> {
    const OP: &str = "load_observations";
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let loaded = if is_json {
        let content = std::fs::read_to_string(path).map_err(|e| io_error(OP, "observations", path, e))?;
        parse_observations_json(&content)
    } else {
        let file = File::open(path).map_err(|e| io_error(OP, "observations", path, e))?;
        parse_observations_csv(BufReader::new(file))
    }
    .map_err(|e| e.with_operation(OP))?;

    loaded.log_dropped("observation", &path.display().to_string());
    Ok(loaded)
}

/// Parse one schedule row (`Skip;Location;Date;Time;Opponent`).
fn parse_event_row(record: &csv::StringRecord) -> Option<EventOccurrence> {
    let date = NaiveDate::parse_from_str(record.get(2)?.trim(), EVENT_DATE_FORMAT).ok()?;
    let time = NaiveTime::parse_from_str(record.get(3)?.trim(), EVENT_TIME_FORMAT).ok()?;
    let is_home = record
        .get(1)
        .map(|loc| loc.trim().eq_ignore_ascii_case("d"))
        .unwrap_or(false);
    let opponent = record
        .get(4)
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .unwrap_or(UNKNOWN_OPPONENT);

    Some(EventOccurrence {
        event_timestamp: date.and_time(time).and_utc(),
        is_home: Some(is_home),
        opponent: Some(opponent.to_string()),
    })
}

/// Parse a semicolon-delimited match schedule. The first row is a header
/// and is skipped regardless of its content.
pub fn parse_events_csv<R: Read>(reader: R) -> RepositoryResult<Loaded<EventOccurrence>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut dropped = 0;
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => {
                return Err(RepositoryError::io_with_context(
                    format!("Failed to read event CSV: {}", e),
                    ErrorContext::new("parse_events_csv").with_entity("events"),
                ))
            }
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        match parse_event_row(&record) {
            Some(event) => records.push(event),
            None => dropped += 1,
        }
    }
    Ok(Loaded { records, dropped })
}

pub fn load_events(path: &Path) -> RepositoryResult<Loaded<EventOccurrence>> {
    const OP: &str = "load_events";
    let file = File::open(path).map_err(|e| io_error(OP, "events", path, e))?;
    let loaded = parse_events_csv(BufReader::new(file)).map_err(|e| e.with_operation(OP))?;
    loaded.log_dropped("event", &path.display().to_string());
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const CSV: &str = "\
stop_id,direction,departure_timestamp,delay_seconds,trip_id,stop_sequence,stop_name
U1,0,2024-01-01T08:05:00Z,30,t1,1,Letenské náměstí
U1,,2024-01-01 08:10:00,-12.5,,,
U2,1,not-a-date,40,t1,2,Sparta
U2,1,2024-01-01T08:20:00+01:00,,t1,2,Sparta
U3,x,2024-01-01T08:30:00Z,NaN,,,
";

    #[test]
    fn test_parse_csv_keeps_valid_rows() {
        let loaded = parse_observations_csv(CSV.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.dropped, 3);

        let first = &loaded.records[0];
        assert_eq!(first.stop_id, "U1");
        assert_eq!(first.direction, Some(0));
        assert_eq!(first.trip_id.as_deref(), Some("t1"));
        assert_eq!(first.stop_sequence, Some(1));
        assert_eq!(first.stop_name.as_deref(), Some("Letenské náměstí"));

        let second = &loaded.records[1];
        assert_eq!(second.direction, None);
        assert_eq!(second.delay_seconds, -12.5);
        assert_eq!(second.trip_id, None);
        assert_eq!(
            second.departure_timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 10, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_csv_requires_core_columns() {
        let err = parse_observations_csv("stop_id,delay_seconds\nU1,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RepositoryError::ParseError { .. }));
        assert!(err.to_string().contains("direction"));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"[
            {"stop_id": "U1", "direction": 1, "departure_timestamp": "2024-01-01T08:00:00Z", "delay_seconds": 15},
            {"stop_id": "U1", "departure_timestamp": "2024-01-01T09:00:00Z", "delay_seconds": null},
            {"stop_id": "", "departure_timestamp": "2024-01-01T09:00:00Z", "delay_seconds": 1}
        ]"#;
        let loaded = parse_observations_json(json).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.dropped, 2);
        assert_eq!(loaded.records[0].direction, Some(1));
        assert!(parse_observations_json("{not json").is_err());
    }

    #[test]
    fn test_parse_events() {
        let csv = "\
Skip;Location;Date;Time;Opponent
1;d;17.08.2024;18:00;Slavia
2; V ;24.08.2024;20:30;
3;d;31.02.2024;18:00;Nobody
4;d;07.09.2024;;Plzen
";
        let loaded = parse_events_csv(csv.as_bytes()).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.dropped, 2);

        let home = &loaded.records[0];
        assert_eq!(
            home.event_timestamp,
            Utc.with_ymd_and_hms(2024, 8, 17, 18, 0, 0).unwrap()
        );
        assert_eq!(home.is_home, Some(true));
        assert_eq!(home.opponent.as_deref(), Some("Slavia"));

        let away = &loaded.records[1];
        assert_eq!(away.is_home, Some(false));
        assert_eq!(away.opponent.as_deref(), Some("TBD"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_observations(Path::new("/nonexistent/stop_times.csv")).unwrap_err();
        assert!(matches!(err, RepositoryError::IoError { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("load_observations"));
    }
}
