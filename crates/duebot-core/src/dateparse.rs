//! Free-text parsing of start/due specifications.
//!
//! Accepted forms: `now`, `today`/`tomorrow`/a weekday name each with an
//! optional time token (`fri`, `friday 17:00`, `tomorrow 5pm`), RFC 3339,
//! `YYYY-MM-DD [HH:MM[:SS]]`, a bare `HH:MM` (today), and relative
//! offsets `+Nd` / `+Nw`. Date-only forms default to 09:00.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized date '{spec}'. Try YYYY-MM-DD [HH:MM], today, tomorrow, +3d, or a weekday like 'fri 17:00'")]
pub struct DateParseError {
    spec: String,
}

const DEFAULT_HOUR: u32 = 9;

/// Parse a date/time specification relative to `now`.
pub fn parse_datetime_spec(spec: &str, now: NaiveDateTime) -> Result<NaiveDateTime, DateParseError> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(err(spec));
    }
    let lower = trimmed.to_ascii_lowercase();

    if lower == "now" {
        return Ok(now);
    }

    if let Some(rest) = lower.strip_prefix('+') {
        return parse_relative(rest, now).ok_or_else(|| err(spec));
    }

    // "today", "tomorrow", and weekday names, with an optional time token
    let mut tokens = lower.split_whitespace();
    if let Some(first) = tokens.next() {
        let date = match first {
            "today" => Some(now.date()),
            "tomorrow" => Some(now.date() + Duration::days(1)),
            other => parse_weekday(other).map(|weekday| next_weekday(now, weekday)),
        };
        if let Some(date) = date {
            let time = match tokens.next() {
                Some(token) => parse_time_token(token).ok_or_else(|| err(spec))?,
                None => default_time(),
            };
            if tokens.next().is_some() {
                return Err(err(spec));
            }
            return Ok(date.and_time(time));
        }
    }

    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(at_default_hour(date));
    }
    if let Some(time) = parse_time_token(&lower) {
        return Ok(now.date().and_time(time));
    }

    Err(err(spec))
}

fn err(spec: &str) -> DateParseError {
    DateParseError {
        spec: spec.trim().to_string(),
    }
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap_or_default()
}

fn at_default_hour(date: NaiveDate) -> NaiveDateTime {
    date.and_time(default_time())
}

fn parse_relative(rest: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if !rest.is_ascii() || rest.len() < 2 {
        return None;
    }
    let (number, unit) = rest.split_at(rest.len() - 1);
    let value: i64 = number.parse().ok()?;
    match unit {
        "d" => Some(now + Duration::days(value)),
        "w" => Some(now + Duration::weeks(value)),
        _ => None,
    }
}

/// Date of the next occurrence of `weekday` strictly after today.
fn next_weekday(now: NaiveDateTime, weekday: Weekday) -> NaiveDate {
    let mut days_ahead = (i64::from(weekday.num_days_from_monday())
        - i64::from(now.weekday().num_days_from_monday()))
    .rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    now.date() + Duration::days(days_ahead)
}

fn parse_weekday(label: &str) -> Option<Weekday> {
    match label {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_time_token(token: &str) -> Option<NaiveTime> {
    let upper = token.to_ascii_uppercase();
    for fmt in ["%H:%M", "%I:%M%p", "%I%p"] {
        if let Ok(time) = NaiveTime::parse_from_str(&upper, fmt) {
            return Some(time);
        }
    }
    None
}
