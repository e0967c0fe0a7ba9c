//! Forecast payload validation and view construction.
//!
//! The forecast body is handled as opaque JSON: validation inspects the
//! shape field-by-field so a malformed payload is classified as incomplete
//! data rather than failing deserialization of the whole response.

use serde_json::Value;

use skycast_core::{City, LookupError, TemperatureUnit};

use crate::format::safe_number;
use crate::labels;
use crate::view::{CurrentConditions, DailyEntry, HourlySeries, WeatherView};

const REQUIRED_DAILY: [&str; 5] = [
    "time",
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "precipitation_probability_max",
];

const REQUIRED_HOURLY: [&str; 2] = ["time", "temperature_2m"];

/// Minimum number of forecast days in a complete payload.
const MIN_FORECAST_DAYS: usize = 7;

fn incomplete(detail: &str) -> LookupError {
    LookupError::IncompleteData(detail.to_string())
}

/// Validate a forecast payload against the full contract. Any violation is
/// an `IncompleteData` error; a partial render is never produced.
pub fn validate_payload(payload: &Value) -> Result<(), LookupError> {
    if !payload.is_object() {
        return Err(incomplete("payload is not an object"));
    }

    let current = payload
        .get("current")
        .ok_or_else(|| incomplete("missing current section"))?;
    let hourly = payload
        .get("hourly")
        .ok_or_else(|| incomplete("missing hourly section"))?;
    let daily = payload
        .get("daily")
        .ok_or_else(|| incomplete("missing daily section"))?;

    let day_count = daily
        .get("time")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if day_count < MIN_FORECAST_DAYS {
        return Err(incomplete("daily forecast too short"));
    }

    for field in REQUIRED_DAILY {
        let len = daily.get(field).and_then(Value::as_array).map(Vec::len);
        if len != Some(day_count) {
            return Err(incomplete("daily arrays are inconsistent"));
        }
    }

    let hour_count = hourly
        .get("time")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if hour_count == 0 {
        return Err(incomplete("hourly series is empty"));
    }
    for field in REQUIRED_HOURLY {
        let len = hourly.get(field).and_then(Value::as_array).map(Vec::len);
        if len != Some(hour_count) {
            return Err(incomplete("hourly arrays are inconsistent"));
        }
    }

    let numeric = |field: &str| current.get(field).map_or(false, Value::is_number);
    if !numeric("temperature_2m") || !numeric("weather_code") {
        return Err(incomplete("current conditions are not numeric"));
    }

    Ok(())
}

fn number(section: &Value, field: &str) -> Option<f64> {
    section.get(field).and_then(Value::as_f64)
}

fn string_array(section: &Value, field: &str) -> Vec<String> {
    section
        .get(field)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn number_array(section: &Value, field: &str) -> Vec<f64> {
    section
        .get(field)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|v| safe_number(v.as_f64()))
                .collect()
        })
        .unwrap_or_default()
}

/// Validate the payload and assemble the render-ready snapshot.
pub fn build_view(
    city: &City,
    unit: TemperatureUnit,
    payload: &Value,
) -> Result<WeatherView, LookupError> {
    validate_payload(payload)?;

    // Sections are present after validation; treat them as empty objects
    // if absent to keep extraction total.
    let current = payload.get("current").cloned().unwrap_or(Value::Null);
    let hourly = payload.get("hourly").cloned().unwrap_or(Value::Null);
    let daily = payload.get("daily").cloned().unwrap_or(Value::Null);

    let weather_code = number(&current, "weather_code").unwrap_or(0.0).round() as i32;
    let conditions = CurrentConditions {
        time: current
            .get("time")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        temperature: safe_number(number(&current, "temperature_2m")),
        apparent: safe_number(number(&current, "apparent_temperature")),
        humidity: safe_number(number(&current, "relative_humidity_2m")),
        wind_speed: safe_number(number(&current, "wind_speed_10m")),
        precipitation: safe_number(number(&current, "precipitation")),
        weather_code,
        is_day: number(&current, "is_day").unwrap_or(1.0) as i64 == 1,
        label: labels::describe(weather_code),
    };

    let series = HourlySeries {
        times: string_array(&hourly, "time"),
        temperatures: number_array(&hourly, "temperature_2m"),
    };

    let dates = string_array(&daily, "time");
    let codes = number_array(&daily, "weather_code");
    let highs = number_array(&daily, "temperature_2m_max");
    let lows = number_array(&daily, "temperature_2m_min");
    let precip = number_array(&daily, "precipitation_probability_max");

    let days = dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let code = codes.get(i).copied().unwrap_or(0.0).round() as i32;
            DailyEntry {
                date,
                weather_code: code,
                label: labels::describe(code),
                high: highs.get(i).copied().unwrap_or(0.0),
                low: lows.get(i).copied().unwrap_or(0.0),
                precipitation_probability: precip.get(i).copied().unwrap_or(0.0),
            }
        })
        .collect();

    Ok(WeatherView {
        city: city.clone(),
        unit,
        current: conditions,
        hourly: series,
        daily: days,
    })
}
