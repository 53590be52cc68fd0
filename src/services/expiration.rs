use chrono::{DateTime, Utc};

/// Instant (ms since epoch) at which a URL signed at `timestamp_millis` stops
/// being valid. Saturates rather than overflowing.
pub fn expiry_millis(timestamp_millis: i64, ttl_seconds: i64) -> i64 {
    timestamp_millis.saturating_add(ttl_seconds.saturating_mul(1000))
}

/// `now >= timestamp + ttl`. Reaching the expiry instant counts as expired.
pub fn is_expired(timestamp_millis: i64, ttl_seconds: i64, now_millis: i64) -> bool {
    now_millis >= expiry_millis(timestamp_millis, ttl_seconds)
}

pub fn is_expired_at(timestamp: DateTime<Utc>, ttl_seconds: i64, now: DateTime<Utc>) -> bool {
    is_expired(
        timestamp.timestamp_millis(),
        ttl_seconds,
        now.timestamp_millis(),
    )
}

/// Expiry instant, or `None` when it falls outside the representable range
pub fn expires_at(timestamp: DateTime<Utc>, ttl_seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(expiry_millis(timestamp.timestamp_millis(), ttl_seconds))
}
