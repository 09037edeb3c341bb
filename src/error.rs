//! Error types for the validated boundaries of the gradebook.
//!
//! The scoring and period-resolution core has no error channel; these types
//! only cover configuration, calendars and input files.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::SixWeeksPeriod;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown grade category `{0}` (expected Daily or Assessment)")]
    Category(String),
    #[error("unknown six-weeks period `{0}` (expected 1SW through 6SW)")]
    Period(String),
    #[error("unknown averaging policy `{0}` (expected weighted or flat)")]
    Policy(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("calendar has no period ranges")]
    Empty,
    #[error("{period} ends ({end}) before it starts ({start})")]
    Inverted {
        period: SixWeeksPeriod,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("{later} starts on {start}, overlapping or preceding {earlier}")]
    OutOfOrder {
        earlier: SixWeeksPeriod,
        later: SixWeeksPeriod,
        start: NaiveDate,
    },
    #[error("{0} is defined more than once")]
    Duplicate(SixWeeksPeriod),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("category weights must be non-negative and sum to 1.0 (daily {daily}, assessment {assessment})")]
    InvalidWeights { daily: f64, assessment: f64 },
    #[error("match threshold {0} is outside 0.0..=1.0")]
    InvalidThreshold(f64),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: row {row} is invalid")]
    Row {
        path: PathBuf,
        row: u64,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a Classroom roster")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
