use std::fmt;

use serde::{Deserialize, Serialize};

const MILLIS_PER_SECOND: i64 = 1000;
const SECONDS_PER_MINUTE: i64 = 60;
const MINUTES_PER_HOUR: i64 = 60;
const MILLIS_PER_MINUTE: i64 = MILLIS_PER_SECOND * SECONDS_PER_MINUTE;
const MILLIS_PER_HOUR: i64 = MILLIS_PER_MINUTE * MINUTES_PER_HOUR;

/// Whole milliseconds from a logical zero. May be negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    total_ms: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimestampParts {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub millis: i64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { total_ms: 0 };

    /// Combines the fields with fixed weights. Out-of-range fields (e.g.
    /// `minutes = 90`) contribute their full magnitude.
    pub fn from_parts(parts: TimestampParts) -> Self {
        let total_ms = parts.hours * MILLIS_PER_HOUR
            + parts.minutes * MILLIS_PER_MINUTE
            + parts.seconds * MILLIS_PER_SECOND
            + parts.millis;
        Self { total_ms }
    }

    /// Like [`Timestamp::from_parts`], but `None` when the total does not
    /// fit in an `i64`.
    pub fn checked_from_parts(parts: TimestampParts) -> Option<Self> {
        let total_ms = parts
            .hours
            .checked_mul(MILLIS_PER_HOUR)?
            .checked_add(parts.minutes.checked_mul(MILLIS_PER_MINUTE)?)?
            .checked_add(parts.seconds.checked_mul(MILLIS_PER_SECOND)?)?
            .checked_add(parts.millis)?;
        Some(Self { total_ms })
    }

    pub const fn from_millis(total_ms: i64) -> Self {
        Self { total_ms }
    }

    pub const fn total_ms(self) -> i64 {
        self.total_ms
    }

    /// Decomposes with truncating division, so every field carries the sign
    /// of the total and `from_parts(t.to_parts()) == t` for any `t`.
    pub fn to_parts(self) -> TimestampParts {
        let t = self.total_ms;
        TimestampParts {
            hours: t / MILLIS_PER_HOUR,
            minutes: (t / MILLIS_PER_MINUTE) % MINUTES_PER_HOUR,
            seconds: (t / MILLIS_PER_SECOND) % SECONDS_PER_MINUTE,
            millis: t % MILLIS_PER_SECOND,
        }
    }

    pub fn pretty_print(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_ms < 0 {
            f.write_str("-")?;
        }
        let p = Timestamp::from_millis(self.total_ms.saturating_abs()).to_parts();
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            p.hours, p.minutes, p.seconds, p.millis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(hours: i64, minutes: i64, seconds: i64, millis: i64) -> TimestampParts {
        TimestampParts {
            hours,
            minutes,
            seconds,
            millis,
        }
    }

    #[test]
    fn pretty_prints_padded_fields() {
        let ts = Timestamp::from_parts(parts(1, 43, 16, 782));
        assert_eq!(ts.pretty_print(), "01:43:16.782");
        assert_eq!(Timestamp::ZERO.pretty_print(), "00:00:00.000");
        assert_eq!(Timestamp::from_millis(5).pretty_print(), "00:00:00.005");
    }

    #[test]
    fn hours_widen_beyond_two_digits() {
        let ts = Timestamp::from_parts(parts(123, 4, 5, 6));
        assert_eq!(ts.pretty_print(), "123:04:05.006");
    }

    #[test]
    fn negative_times_print_with_sign() {
        assert_eq!(Timestamp::from_millis(-61_001).pretty_print(), "-00:01:01.001");
    }

    #[test]
    fn out_of_range_fields_contribute_full_magnitude() {
        let ts = Timestamp::from_parts(parts(0, 90, 0, 0));
        assert_eq!(ts.total_ms(), 90 * 60 * 1000);
        assert_eq!(ts.to_parts(), parts(1, 30, 0, 0));
    }

    #[test]
    fn checked_parts_refuse_overflow() {
        assert_eq!(
            Timestamp::checked_from_parts(parts(1, 2, 3, 4)),
            Some(Timestamp::from_parts(parts(1, 2, 3, 4)))
        );
        assert_eq!(Timestamp::checked_from_parts(parts(9_999_999_999_999, 0, 0, 0)), None);
        assert_eq!(Timestamp::checked_from_parts(parts(0, 0, 1, i64::MAX)), None);
        assert_eq!(
            Timestamp::checked_from_parts(parts(0, 0, 0, i64::MAX)),
            Some(Timestamp::from_millis(i64::MAX))
        );
    }

    #[test]
    fn normalized_parts_survive_decomposition() {
        for p in [
            parts(0, 0, 0, 0),
            parts(0, 0, 0, 999),
            parts(0, 59, 59, 999),
            parts(1, 43, 16, 782),
            parts(27, 0, 1, 0),
            parts(100, 12, 34, 567),
        ] {
            assert_eq!(Timestamp::from_parts(p).to_parts(), p);
        }
    }

    #[test]
    fn any_total_survives_decomposition() {
        for ms in [-3_723_004, -1, 0, 1, 59_999, 3_600_000, 86_399_999] {
            let ts = Timestamp::from_millis(ms);
            assert_eq!(Timestamp::from_parts(ts.to_parts()), ts);
        }
    }

    #[test]
    fn serializes_as_plain_millis() {
        let ts = Timestamp::from_millis(2500);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "2500");
        let back: Timestamp = serde_json::from_str("2500").unwrap();
        assert_eq!(back, ts);
    }
}
