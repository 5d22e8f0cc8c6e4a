//! Timestamp helpers for the database layer.
//!
//! Every timestamp column is an `INTEGER` holding Unix epoch milliseconds (UTC).

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Current time as Unix epoch milliseconds (UTC).
#[inline]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix epoch milliseconds to `DateTime<Utc>`.
///
/// Out-of-range values fall back to the Unix epoch instead of panicking.
pub fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .earliest()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Lower bound (inclusive, epoch ms) of a window ending at `now_ms` and spanning `window`.
#[inline]
pub fn window_start_ms(now_ms: i64, window: Duration) -> i64 {
    now_ms.saturating_sub(window.num_milliseconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_roundtrip_precision() {
        let now = now_ms();
        assert_eq!(ms_to_datetime(now).timestamp_millis(), now);
    }

    #[test]
    fn test_out_of_range_falls_back_to_epoch() {
        assert_eq!(ms_to_datetime(i64::MAX), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_window_start() {
        let day = Duration::days(1).num_milliseconds();
        assert_eq!(window_start_ms(10 * day, Duration::days(3)), 7 * day);
    }
}
