use std::fmt::Display;

use chrono::{NaiveDate, TimeZone, Utc};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Interval suffixes whose bars are keyed by calendar date alone.
const DATE_ONLY_SUFFIXES: &[&str] = &["d", "wk", "mo"];

pub fn is_date_interval(interval: &str) -> bool {
    DATE_ONLY_SUFFIXES
        .iter()
        .any(|suffix| interval.ends_with(suffix))
}

/// Render a Unix timestamp as a series key in `tz`. `None` when the timestamp is out of range.
pub fn format_time_key<Tz>(timestamp: i64, date_only: bool, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let instant = Utc.timestamp_opt(timestamp, 0).single()?;
    let local = instant.with_timezone(tz);
    let format = if date_only {
        DATE_KEY_FORMAT
    } else {
        DATETIME_KEY_FORMAT
    };
    Some(local.format(format).to_string())
}

/// Midnight UTC of a `YYYY-MM-DD` date, as Unix seconds.
pub fn parse_start_date(value: &str) -> Result<i64, chrono::ParseError> {
    let date = NaiveDate::parse_from_str(value.trim(), DATE_KEY_FORMAT)?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp())
}

pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}
