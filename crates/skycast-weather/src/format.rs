//! Display formatting and the numeric rounding policy.
//!
//! All displayed quantities round to one decimal place, except final
//! temperature display which rounds to the nearest whole degree.

use chrono::{NaiveDate, NaiveDateTime};

use skycast_core::TemperatureUnit;

const DEGREE: char = '\u{00b0}';

/// Clamp a possibly-absent or non-finite value to a displayable number,
/// rounded to one decimal place.
pub fn safe_number(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => (v * 10.0).round() / 10.0,
        _ => 0.0,
    }
}

/// Whole-degree temperature with unit suffix, e.g. `18°C`.
pub fn format_temp(value: f64, unit: TemperatureUnit) -> String {
    let rounded = safe_number(Some(value)).round() as i64;
    format!("{rounded}{DEGREE}{}", unit.suffix())
}

/// Parse an Open-Meteo timestamp. The API emits minute precision
/// (`2024-03-02T15:00`); dates without a time component resolve to
/// midnight.
pub fn parse_time(input: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Hour label for the chart axis, e.g. `3 PM`. `None` when unparsable.
pub fn format_hour(input: &str) -> Option<String> {
    parse_time(input).map(|dt| dt.format("%-I %p").to_string())
}

/// Day label for forecast cards, e.g. `Sat, Mar 2`.
pub fn format_day(input: &str) -> String {
    match parse_time(input) {
        Some(dt) => dt.format("%a, %b %-d").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Timestamp label for the "last updated" line, e.g. `Mar 2, 3:00 PM`.
pub fn format_datetime(input: &str) -> String {
    match parse_time(input) {
        Some(dt) => dt.format("%b %-d, %-I:%M %p").to_string(),
        None => "--".to_string(),
    }
}
