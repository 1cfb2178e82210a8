use chrono::{Duration, NaiveDate};

use crate::error::{Error, Result};

/// Canonical day format, used both on the wire and as the stored high-water-mark.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Lookback applied when the aggregate has never recorded a high-water-mark.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 15;

/// The calendar day immediately following `day`.
pub fn next_day(day: NaiveDate) -> NaiveDate {
    day + Duration::days(1)
}

/// Format a day as zero-padded `YYYY-MM-DD`.
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` string.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
        .map_err(|e| Error::DateParse(format!("{s}: {e}")))
}

/// Where a fresh walk starts: `lookback_days` before `today`.
pub fn default_start(today: NaiveDate, lookback_days: u32) -> NaiveDate {
    today - Duration::days(lookback_days as i64)
}

/// Number of days the walk from `start` up to (excluding) `today` will visit.
pub fn days_until(start: NaiveDate, today: NaiveDate) -> usize {
    (today - start).num_days().max(0) as usize
}
