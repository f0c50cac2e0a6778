// Time series domain models
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("missing the required qualifier {0}")]
    MissingQualifier(String),
    #[error("invalid timestamp {raw:?}")]
    InvalidTimestamp {
        raw: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// One sample of a provider series. A `None` value still marks the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedValue {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl TimedValue {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    /// Parse an ISO-8601 timestamp as sent by the forecast API.
    /// Timestamps without an offset are read as UTC.
    pub fn parse(raw: &str, value: Option<f64>) -> Result<Self, SeriesError> {
        let timestamp = parse_instant(raw)?;
        Ok(Self::new(timestamp, value))
    }
}

pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, SeriesError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc_err) => raw
            .parse::<NaiveDateTime>()
            .map(|naive| naive.and_utc())
            .map_err(|_| SeriesError::InvalidTimestamp {
                raw: raw.to_string(),
                source: rfc_err,
            }),
    }
}

/// A tagged sub-series inside a provider bundle ("main", "p05", "p95", ...)
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedSeries {
    pub series_id: Option<i64>,
    pub qualifier: String,
    pub values: Vec<TimedValue>,
}

impl QualifiedSeries {
    pub fn new(series_id: Option<i64>, qualifier: String, values: Vec<TimedValue>) -> Self {
        Self {
            series_id,
            qualifier,
            values,
        }
    }
}

pub fn select_by_qualifier<'a>(
    series: &'a [QualifiedSeries],
    qualifier: &str,
) -> Result<&'a [TimedValue], SeriesError> {
    series
        .iter()
        .find(|s| s.qualifier == qualifier)
        .map(|s| s.values.as_slice())
        .ok_or_else(|| SeriesError::MissingQualifier(qualifier.to_string()))
}

/// Like [`select_by_qualifier`], but an unconfigured qualifier selects nothing.
pub fn select_optional_qualifier<'a>(
    series: &'a [QualifiedSeries],
    qualifier: Option<&str>,
) -> Result<&'a [TimedValue], SeriesError> {
    match qualifier {
        Some(q) => select_by_qualifier(series, q),
        None => Ok(&[]),
    }
}
