use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::FieldError;

/// Field carrying the MAC itself
pub const FIELD_HMAC: &str = "hmac";
/// Field carrying the signing timestamp
pub const FIELD_HMAC_TIMESTAMP: &str = "hmac-ts";
/// Field carrying the time-to-live in seconds
pub const FIELD_HMAC_TTL: &str = "hmac-ttl";

/// Time-to-live of one day, in seconds
pub const TTL_ONE_DAY: i64 = 24 * 60 * 60;

/// Wire form of timestamps. Always interpreted as UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Named fields of a signed URL, ordered by name.
///
/// The ordering is byte-wise on the UTF-8 name, which is the ordering the
/// canonical string uses.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Names left out of the string that is fed into the MAC
pub type ExceptedFields = BTreeSet<String>;

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// Renders the value the way it appears on the wire
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a fourteen-digit `YYYYMMDDHHMMSS` timestamp as UTC
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, FieldError> {
    if text.len() != 14 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::InvalidTimestamp(text.to_string()));
    }
    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|_| FieldError::InvalidTimestamp(text.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Only years 0000-9999 fit the fourteen-digit wire form
fn check_wire_year(ts: DateTime<Utc>) -> Result<DateTime<Utc>, FieldError> {
    if (0..=9999).contains(&ts.year()) {
        Ok(ts)
    } else {
        Err(FieldError::InvalidTimestamp(format_timestamp(&ts)))
    }
}

/// Reserved field names with typed values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedField {
    Hmac,
    Timestamp,
    TimeToLive,
}

impl ReservedField {
    pub const ALL: [ReservedField; 3] = [
        ReservedField::Hmac,
        ReservedField::Timestamp,
        ReservedField::TimeToLive,
    ];

    /// Case-insensitive lookup of a reserved name
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|reserved| reserved.name().eq_ignore_ascii_case(name))
    }

    /// Name a field is stored and excepted under
    pub fn canonical_name(name: &str) -> &str {
        Self::lookup(name).map_or(name, |reserved| reserved.name())
    }

    /// Canonical lower-case name
    pub fn name(self) -> &'static str {
        match self {
            ReservedField::Hmac => FIELD_HMAC,
            ReservedField::Timestamp => FIELD_HMAC_TIMESTAMP,
            ReservedField::TimeToLive => FIELD_HMAC_TTL,
        }
    }

    /// Convert a raw value into the typed form this field stores.
    ///
    /// Text is parsed for `hmac-ts` and `hmac-ttl`; any value is rendered to
    /// text for `hmac`.
    pub fn convert(self, value: FieldValue) -> Result<FieldValue, FieldError> {
        match (self, value) {
            (ReservedField::Hmac, FieldValue::Text(s)) => Ok(FieldValue::Text(s)),
            (ReservedField::Hmac, other) => Ok(FieldValue::Text(other.to_string())),

            (ReservedField::Timestamp, FieldValue::Text(s)) => {
                parse_timestamp(&s).map(FieldValue::Timestamp)
            }
            (ReservedField::Timestamp, FieldValue::Timestamp(ts)) => {
                check_wire_year(ts).map(FieldValue::Timestamp)
            }
            (ReservedField::Timestamp, FieldValue::Integer(_)) => Err(FieldError::TypeMismatch {
                field: FIELD_HMAC_TIMESTAMP,
                expected: "timestamp",
            }),

            (ReservedField::TimeToLive, FieldValue::Text(s)) => s
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| FieldError::InvalidInteger(s)),
            (ReservedField::TimeToLive, n @ FieldValue::Integer(_)) => Ok(n),
            (ReservedField::TimeToLive, FieldValue::Timestamp(_)) => {
                Err(FieldError::TypeMismatch {
                    field: FIELD_HMAC_TTL,
                    expected: "integer",
                })
            }
        }
    }
}
