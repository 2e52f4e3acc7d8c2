//! Wall-clock source for `checked_at`, and timezone-aware display.
//!
//! Timestamps are stored in UTC; the configured IANA zone is applied only when
//! formatting for tables and CSV.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Display format for `checked_at` and "last updated" captions.
pub const CHECKED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant (tests, replays).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parse an IANA timezone name such as `Asia/Kolkata`.
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown timezone '{name}'"))
}

/// Format a UTC instant as local wall time in `tz`.
pub fn format_local(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format(CHECKED_AT_FORMAT).to_string()
}

/// Parse a wall-time string produced by [`format_local`] back to UTC.
///
/// Whole seconds only. A wall time repeated by a DST fall-back is ambiguous
/// and resolves to the earlier instant, so an instant from the second pass
/// through that hour comes back one hour early.
pub fn parse_local(s: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), CHECKED_AT_FORMAT)
        .map_err(|e| format!("bad timestamp '{s}': {e}"))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{s}' does not exist in {tz}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_in_configured_zone() {
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 4, 15, 0).unwrap();
        let tz = parse_timezone("Asia/Kolkata").unwrap();
        assert_eq!(format_local(at, tz), "2024-06-03 09:45:00");
    }

    #[test]
    fn local_format_roundtrips() {
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 4, 15, 7).unwrap();
        let tz = parse_timezone("America/New_York").unwrap();
        assert_eq!(parse_local(&format_local(at, tz), tz).unwrap(), at);
    }

    #[test]
    fn repeated_fall_back_hour_resolves_to_earlier_instant() {
        let tz = parse_timezone("America/New_York").unwrap();
        // 01:30 EST, the second 01:30 of the night.
        let second = Utc.with_ymd_and_hms(2024, 11, 3, 6, 30, 0).unwrap();
        let first = Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap();
        assert_eq!(format_local(second, tz), "2024-11-03 01:30:00");
        assert_eq!(format_local(first, tz), "2024-11-03 01:30:00");
        assert_eq!(parse_local("2024-11-03 01:30:00", tz).unwrap(), first);
    }

    #[test]
    fn skipped_spring_forward_time_is_rejected() {
        let tz = parse_timezone("America/New_York").unwrap();
        assert!(parse_local("2024-03-10 02:30:00", tz).is_err());
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn fixed_clock_is_fixed() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }
}
