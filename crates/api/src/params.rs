//! Presence and shape checks shared by the handlers.
//!
//! Validation is deliberately shallow: required fields must be present and
//! parseable, everything else is left to the remote procedures.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Reporting window accepted by the analytics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// Parse an optional query value; absent means the default window.
    pub fn from_query(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::default()),
            Some(raw) => raw.parse(),
        }
    }
}

impl FromStr for Period {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(ApiError::BadRequest(format!(
                "Invalid period '{other}'. Expected one of: week, month, quarter, year"
            ))),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a required field.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::missing_field(field))
}

/// Required text field; blank counts as missing.
pub fn require_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    let value = value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
    require(value, field)
}

/// Optional text field; blank counts as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field}: expected a UUID")))
}

pub fn require_uuid(value: Option<String>, field: &str) -> Result<Uuid, ApiError> {
    parse_uuid(&require_text(value, field)?, field)
}

pub fn optional_uuid(value: Option<String>, field: &str) -> Result<Option<Uuid>, ApiError> {
    optional_text(value)
        .map(|raw| parse_uuid(&raw, field))
        .transpose()
}

pub fn parse_time(raw: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field}: expected an RFC 3339 timestamp")))
}

pub fn require_time(value: Option<String>, field: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_time(&require_text(value, field)?, field)
}

pub fn optional_time(value: Option<String>, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    optional_text(value)
        .map(|raw| parse_time(&raw, field))
        .transpose()
}

/// `start` must be strictly before `end`.
pub fn ensure_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ApiError> {
    if start < end {
        Ok(())
    } else {
        Err(ApiError::BadRequest("endTime must be after startTime".into()))
    }
}

/// `value` must be one of `allowed`.
pub fn one_of(value: String, field: &str, allowed: &[&str]) -> Result<String, ApiError> {
    if allowed.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!(
            "Invalid {field} '{value}'. Expected one of: {}",
            allowed.join(", ")
        )))
    }
}

/// Integer in `min..=max`, or `default` when absent.
pub fn bounded(value: Option<i64>, field: &str, default: i64, min: i64, max: i64) -> Result<i64, ApiError> {
    match value {
        None => Ok(default),
        Some(v) if (min..=max).contains(&v) => Ok(v),
        Some(v) => Err(ApiError::BadRequest(format!(
            "Invalid {field} {v}: expected a value between {min} and {max}"
        ))),
    }
}

/// A JSON request body that must be a non-empty object.
pub fn require_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => Err(ApiError::BadRequest("Request body is empty".into())),
        _ => Err(ApiError::BadRequest("Request body must be a JSON object".into())),
    }
}

/// A procedure result that must name an existing entity.
pub fn found(value: Value, what: &str) -> Result<Value, ApiError> {
    match value {
        Value::Null | Value::Bool(false) => Err(ApiError::NotFound(format!("{what} not found"))),
        other => Ok(other),
    }
}
