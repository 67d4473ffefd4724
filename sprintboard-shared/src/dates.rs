/// Date input parsing for sprint start/end dates
///
/// Accepted forms, tried in order:
///
/// - `D-M-YYYY` / `DD-MM-YYYY` (day first, e.g. `20-02-2026`)
/// - RFC 3339 (`2026-02-20T09:30:00Z`, `2026-02-20T09:30:00+02:00`)
/// - `YYYY-MM-DD`
/// - `YYYY-MM-DDTHH:MM:SS[.fff]` without offset
///
/// Inputs without a time of day resolve to midnight UTC; inputs without an
/// offset are read as UTC. Impossible calendar dates (`31-02-2026`) are
/// rejected rather than rolled over.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid date format. Use DD-MM-YYYY or ISO format")]
pub struct InvalidDate;

/// Parses an optional date field
///
/// Blank input is `Ok(None)`.
pub fn parse_date(input: &str) -> Result<Option<DateTime<Utc>>, InvalidDate> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    parse_day_first(input)
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|d| d.with_timezone(&Utc)))
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|d| d.and_utc())
        })
        .map(Some)
        .ok_or(InvalidDate)
}

fn parse_day_first(input: &str) -> Option<DateTime<Utc>> {
    let mut parts = input.split('-');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(day, 1, 2) || !digits(month, 1, 2) || !digits(year, 4, 4) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}
