//! Helpers that stamp a field map with a signing time and a time-to-live
//! computed from a calendar offset.

use chrono::{DateTime, Duration, Months, SubsecRound, Utc};

use crate::error::FieldError;
use crate::models::{FieldMap, FieldValue, FIELD_HMAC_TIMESTAMP, FIELD_HMAC_TTL};

/// Calendar offset from the signing time. Zero components are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemporalOffset {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl TemporalOffset {
    pub fn years(years: u32) -> Self {
        Self {
            years,
            ..Default::default()
        }
    }

    pub fn months(months: u32) -> Self {
        Self {
            months,
            ..Default::default()
        }
    }

    pub fn days(days: u32) -> Self {
        Self {
            days,
            ..Default::default()
        }
    }

    pub fn hours(hours: u32) -> Self {
        Self {
            hours,
            ..Default::default()
        }
    }

    pub fn minutes(minutes: u32) -> Self {
        Self {
            minutes,
            ..Default::default()
        }
    }

    pub fn seconds(seconds: u32) -> Self {
        Self {
            seconds,
            ..Default::default()
        }
    }

    /// Add the offset to `from`. Years and months follow the calendar
    /// (clamping to the end of shorter months); days are 24-hour spans.
    pub fn apply(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = self.years.checked_mul(12)?.checked_add(self.months)?;
        let shifted = from.checked_add_months(Months::new(months))?;
        let seconds = i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3_600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        shifted.checked_add_signed(Duration::seconds(seconds))
    }

    /// Length of the offset in whole seconds when started at `from`
    pub fn ttl_seconds(&self, from: DateTime<Utc>) -> Option<i64> {
        let until = self.apply(from)?;
        Some((until.timestamp_millis() - from.timestamp_millis()) / 1000)
    }
}

/// Stamp `fields` with `hmac-ts = from` and the matching `hmac-ttl`.
///
/// Returns the time-to-live that was stored.
pub fn add_temporal_mark(
    fields: &mut FieldMap,
    from: DateTime<Utc>,
    offset: TemporalOffset,
) -> Result<i64, FieldError> {
    let ttl = offset
        .ttl_seconds(from)
        .ok_or_else(|| FieldError::InvalidTimestamp(format!("{from} + {offset:?}")))?;

    fields.insert(FIELD_HMAC_TIMESTAMP.to_string(), FieldValue::Timestamp(from));
    fields.insert(FIELD_HMAC_TTL.to_string(), FieldValue::Integer(ttl));
    Ok(ttl)
}

/// [`add_temporal_mark`] starting now, truncated to whole seconds
pub fn add_temporal_mark_now(
    fields: &mut FieldMap,
    offset: TemporalOffset,
) -> Result<i64, FieldError> {
    add_temporal_mark(fields, Utc::now().trunc_subsecs(0), offset)
}

pub fn remove_temporal_mark(fields: &mut FieldMap) {
    fields.remove(FIELD_HMAC_TIMESTAMP);
    fields.remove(FIELD_HMAC_TTL);
}
