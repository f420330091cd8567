//! Parses the `--begin`/`--end` replay window flags into epoch seconds.
//!
//! Accepts a bare `HH:MM` (resolved against a base date, normally "today"), a
//! full `YYYY-MM-DD HH:MM[:SS]` timestamp, a bare `YYYY-MM-DD` date (midnight),
//! or a raw epoch integer (for scripting).

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    Empty,
    Invalid(String),
}

impl fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeParseError::Empty => write!(f, "empty time string"),
            TimeParseError::Invalid(s) => write!(f, "invalid time '{s}'"),
        }
    }
}

impl std::error::Error for TimeParseError {}

/// Parses `s` against today's local date as the base.
pub fn parse_time(s: &str) -> Result<i64, TimeParseError> {
    parse_time_with_base(s, Local::now().date_naive())
}

/// Parses `s`, resolving a bare `HH:MM[:SS]` against `base` instead of today.
pub fn parse_time_with_base(s: &str, base: NaiveDate) -> Result<i64, TimeParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TimeParseError::Empty);
    }

    if let Ok(epoch) = s.parse::<i64>() {
        return Ok(epoch);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return to_epoch(naive);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return to_epoch(naive);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive = date
            .and_time(NaiveTime::from_hms_opt(0, 0, 0).expect("valid midnight"));
        return to_epoch(naive);
    }
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(s, fmt) {
            let naive = base.and_time(time);
            return to_epoch(naive);
        }
    }

    Err(TimeParseError::Invalid(s.to_string()))
}

fn to_epoch(naive: NaiveDateTime) -> Result<i64, TimeParseError> {
    match Local.from_local_datetime(&naive).single() {
        Some(dt) => Ok(dt.timestamp()),
        None => Err(TimeParseError::Invalid(naive.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epoch_integer() {
        assert_eq!(parse_time("1700000000").unwrap(), 1_700_000_000);
    }

    #[test]
    fn parses_full_datetime() {
        let base = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let epoch = parse_time_with_base("2026-07-28 10:30:00", base).unwrap();
        assert!(epoch > 0);
    }

    #[test]
    fn parses_bare_hhmm_against_base() {
        let base = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let a = parse_time_with_base("09:00", base).unwrap();
        let b = parse_time_with_base("2026-07-28 09:00", base).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(parse_time("").is_err());
        assert!(parse_time("not-a-time").is_err());
    }

    #[test]
    fn bare_date_means_midnight() {
        let base = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let day = parse_time_with_base("2026-07-28", base).unwrap();
        let midnight = parse_time_with_base("2026-07-28 00:00:00", base).unwrap();
        assert_eq!(day, midnight);
    }
}
