//! The render-ready weather snapshot and its derived helpers.

use serde::Serialize;

use skycast_core::{City, TemperatureUnit};

use crate::format;

/// Transient snapshot of the last successful fetch. Replaced wholesale on
/// every success, never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub city: City,
    pub unit: TemperatureUnit,
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
    pub daily: Vec<DailyEntry>,
}

/// Current conditions block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    /// Observation timestamp as reported by the service.
    pub time: String,
    pub temperature: f64,
    pub apparent: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub weather_code: i32,
    pub is_day: bool,
    /// Label for the weather code, e.g. "Partly cloudy".
    pub label: &'static str,
}

/// Hourly time/temperature series, kept raw for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct HourlySeries {
    pub times: Vec<String>,
    pub temperatures: Vec<f64>,
}

/// One forecast-day card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEntry {
    pub date: String,
    pub weather_code: i32,
    pub label: &'static str,
    pub high: f64,
    pub low: f64,
    pub precipitation_probability: f64,
}

/// Backdrop classification for the theming layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Atmosphere {
    ClearDay,
    Rain,
    Snow,
    Storm,
    Night,
    Cloud,
}

/// Classify current conditions into a backdrop. Storm/snow/rain override
/// the night backdrop; a clear sky only counts during the day.
pub fn atmosphere(code: i32, is_day: bool) -> Atmosphere {
    if matches!(code, 95 | 96 | 99) {
        Atmosphere::Storm
    } else if matches!(code, 71 | 73 | 75 | 77 | 85 | 86) {
        Atmosphere::Snow
    } else if matches!(code, 51..=57 | 61..=67 | 80..=82) {
        Atmosphere::Rain
    } else if is_day && matches!(code, 0 | 1) {
        Atmosphere::ClearDay
    } else if !is_day {
        Atmosphere::Night
    } else {
        Atmosphere::Cloud
    }
}

/// One charted hourly sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Slice the hourly series for charting: up to 24 samples starting at the
/// first one at or after `reference`. An unparsable reference starts from
/// index 0; an empty series yields an empty chart, which is a legitimate
/// "no chart data" outcome rather than an error.
pub fn hourly_window(times: &[String], temperatures: &[f64], reference: &str) -> Vec<ChartPoint> {
    if times.is_empty() || temperatures.is_empty() {
        return Vec::new();
    }

    let start = match format::parse_time(reference) {
        Some(ref_time) => times
            .iter()
            .position(|t| format::parse_time(t).is_some_and(|dt| dt >= ref_time))
            .unwrap_or(0),
        None => 0,
    };

    times
        .iter()
        .zip(temperatures.iter())
        .skip(start)
        .take(24)
        .filter_map(|(time, temp)| {
            format::format_hour(time).map(|label| ChartPoint {
                label,
                value: format::safe_number(Some(*temp)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn series(hours: usize) -> (Vec<String>, Vec<f64>) {
        let times = (0..hours)
            .map(|h| format!("2024-03-02T{:02}:00", h % 24))
            .collect();
        let temps = (0..hours).map(|h| h as f64).collect();
        (times, temps)
    }

    #[test]
    fn test_window_starts_at_reference() {
        let (times, temps) = series(24);
        let points = hourly_window(&times, &temps, "2024-03-02T05:30");
        // First sample at or after 05:30 is 06:00.
        assert_eq!(points[0].label, "6 AM");
        assert_eq!(points[0].value, 6.0);
        assert_eq!(points.len(), 18);
    }

    #[test]
    fn test_window_caps_at_24() {
        let times: Vec<String> = (0..48)
            .map(|h| format!("2024-03-{:02}T{:02}:00", 2 + h / 24, h % 24))
            .collect();
        let temps: Vec<f64> = (0..48).map(f64::from).collect();
        let points = hourly_window(&times, &temps, "2024-03-02T00:00");
        assert_eq!(points.len(), 24);
    }

    #[test]
    fn test_window_unparsable_reference_starts_at_zero() {
        let (times, temps) = series(6);
        let points = hourly_window(&times, &temps, "not a time");
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].value, 0.0);
    }

    #[test]
    fn test_window_empty_series_is_empty() {
        assert!(hourly_window(&[], &[], "2024-03-02T00:00").is_empty());
    }

    #[test]
    fn test_window_reference_past_series_starts_at_zero() {
        let (times, temps) = series(4);
        let points = hourly_window(&times, &temps, "2025-01-01T00:00");
        // No sample at/after the reference; fall back to the start.
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_atmosphere_classification() {
        assert_eq!(atmosphere(95, true), Atmosphere::Storm);
        assert_eq!(atmosphere(95, false), Atmosphere::Storm);
        assert_eq!(atmosphere(73, false), Atmosphere::Snow);
        assert_eq!(atmosphere(61, true), Atmosphere::Rain);
        assert_eq!(atmosphere(0, true), Atmosphere::ClearDay);
        assert_eq!(atmosphere(0, false), Atmosphere::Night);
        assert_eq!(atmosphere(3, true), Atmosphere::Cloud);
        assert_eq!(atmosphere(3, false), Atmosphere::Night);
    }
}
