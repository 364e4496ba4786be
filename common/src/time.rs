//! Time utilities for rate freshness.

use chrono::{DateTime, Utc};

/// Seconds since the Unix epoch, as supplied by the rate source.
pub type UnixSeconds = i64;

/// Seconds in one TTL day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Get the current time in seconds since the epoch.
pub fn now() -> UnixSeconds {
    Utc::now().timestamp()
}

/// Oldest `updated_at` that still counts as fresh for a TTL of `ttl_days`.
pub fn freshness_boundary(now: UnixSeconds, ttl_days: u32) -> UnixSeconds {
    now - i64::from(ttl_days) * SECONDS_PER_DAY
}

/// Convert a source timestamp to a UTC datetime, if it is in range.
pub fn to_datetime(seconds: UnixSeconds) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_boundary() {
        assert_eq!(freshness_boundary(1_000_000, 0), 1_000_000);
        assert_eq!(freshness_boundary(1_000_000, 1), 1_000_000 - 86_400);
        assert_eq!(freshness_boundary(10_000_000, 60), 10_000_000 - 60 * 86_400);
    }

    #[test]
    fn test_now_is_recent() {
        // 2021-01-01T00:00:00Z
        assert!(now() > 1_609_459_200);
    }

    #[test]
    fn test_to_datetime() {
        let dt = to_datetime(1617753602).unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-04-07T00:00:02+00:00");
    }
}
