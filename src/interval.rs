//! FILETIME interval decoding
//!
//! PSO age, lockout duration and observation window attributes hold relative
//! durations as negative counts of 100-nanosecond ticks.

use std::fmt;

/// 100-ns ticks per second
pub const TICKS_PER_SECOND: u64 = 10_000_000;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// A relative duration split into flat calendar units (24-hour days, no
/// timezone or leap adjustment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalParts {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl IntervalParts {
    /// Splits a tick count. The sign is ignored and any sub-second remainder is
    /// truncated.
    pub fn from_ticks(ticks: i64) -> Self {
        let total = ticks.unsigned_abs() / TICKS_PER_SECOND;
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }
}

impl fmt::Display for IntervalParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} days {} hours {} minutes {} seconds",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Decodes a FILETIME interval into `"{d} days {h} hours {m} minutes {s} seconds"`.
///
/// The "never" sentinel (`i64::MIN`) decodes to a very large but well-formed
/// string.
pub fn decode_interval(ticks: i64) -> String {
    IntervalParts::from_ticks(ticks).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(decode_interval(0), "0 days 0 hours 0 minutes 0 seconds");
    }

    #[test]
    fn test_one_minute() {
        assert_eq!(decode_interval(-600_000_000), "0 days 0 hours 1 minutes 0 seconds");
    }

    #[test]
    fn test_one_day() {
        assert_eq!(decode_interval(-864_000_000_000), "1 days 0 hours 0 minutes 0 seconds");
    }

    #[test]
    fn test_mixed_units() {
        // 42 days, 3 hours, 25 minutes, 7 seconds
        let secs: i64 = 42 * 86_400 + 3 * 3_600 + 25 * 60 + 7;
        assert_eq!(
            decode_interval(-secs * 10_000_000),
            "42 days 3 hours 25 minutes 7 seconds"
        );
    }

    #[test]
    fn test_sub_second_truncated() {
        assert_eq!(decode_interval(-19_999_999), "0 days 0 hours 0 minutes 1 seconds");
    }

    #[test]
    fn test_positive_uses_magnitude() {
        assert_eq!(decode_interval(600_000_000), decode_interval(-600_000_000));
    }

    #[test]
    fn test_never_sentinel() {
        // |i64::MIN| / 10^7 = 922337203685 seconds
        let parts = IntervalParts::from_ticks(i64::MIN);
        assert_eq!(parts.days, 10_675_199);
        assert_eq!(
            decode_interval(i64::MIN),
            "10675199 days 2 hours 48 minutes 5 seconds"
        );
    }
}
