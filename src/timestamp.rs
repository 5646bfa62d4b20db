//! Request timestamp parsing.
//!
//! Partners send ISO 8601 date-times, with or without a UTC offset. Two views
//! of the parsed value are kept: the wall-clock value exactly as written,
//! which feeds the signature, and the UTC instant, which feeds the freshness
//! check. Offset-less timestamps are taken to be UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

/// Layout of the timestamp inside the signing string.
pub const SIGNING_FORMAT: &str = "%Y%m%d%H%M%S";

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,
    #[error("'{0}' is not an ISO 8601 date-time")]
    Invalid(String),
}

/// A parsed request timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTime {
    wall: NaiveDateTime,
    utc: DateTime<Utc>,
}

impl RequestTime {
    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TimestampError::Empty);
        }

        // "2024-08-15 02:11:22Z" is as acceptable as "2024-08-15T02:11:22Z"
        let normalized = match trimmed.as_bytes().get(10) {
            Some(b' ') | Some(b't') => format!("{}T{}", &trimmed[..10], &trimmed[11..]),
            _ => trimmed.to_string(),
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
            return Ok(Self::with_offset(dt));
        }

        // trailing designator: UTC at any precision
        if let Some(utc) = normalized.strip_suffix(['Z', 'z']) {
            return parse_naive(utc)
                .map(Self::from_naive)
                .ok_or_else(|| TimestampError::Invalid(trimmed.to_string()));
        }

        OFFSET_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
            .map(Self::with_offset)
            .or_else(|| parse_naive(&normalized).map(Self::from_naive))
            .ok_or_else(|| TimestampError::Invalid(trimmed.to_string()))
    }

    fn with_offset(dt: DateTime<FixedOffset>) -> Self {
        Self {
            wall: dt.naive_local(),
            utc: dt.with_timezone(&Utc),
        }
    }

    fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            wall: naive,
            utc: naive.and_utc(),
        }
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.utc
    }

    /// `yyyyMMddHHmmss` rendering of the wall-clock value.
    pub fn signing_form(&self) -> String {
        self.wall.format(SIGNING_FORMAT).to_string()
    }

    /// Absolute distance between this instant and `now`.
    pub fn skew_from(&self, now: DateTime<Utc>) -> TimeDelta {
        let delta = now - self.utc;
        if delta < TimeDelta::zero() { -delta } else { delta }
    }
}

/// Date-time without offset, down to minutes, or a bare date at midnight.
fn parse_naive(input: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
