//! Forecast fetching from the Open-Meteo forecast API.

use reqwest::Client;
use serde_json::Value;

use skycast_core::{City, LookupError, ReqwestErrorExt, TemperatureUnit};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,weather_code,wind_speed_10m,precipitation,is_day";
const HOURLY_FIELDS: &str = "time,temperature_2m";
const DAILY_FIELDS: &str =
    "time,weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max";

/// Client for the forecast endpoint. Returns the raw JSON payload;
/// validation and view construction live in [`crate::payload`].
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastClient {
    pub fn new() -> Self {
        Self::with_base_url(FORECAST_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch a 7-day forecast for `city` with temperatures in `unit`.
    /// Wind speed is always requested in km/h.
    pub async fn fetch(&self, city: &City, unit: TemperatureUnit) -> Result<Value, LookupError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", city.latitude.to_string().as_str()),
                ("longitude", city.longitude.to_string().as_str()),
                ("timezone", "auto"),
                ("forecast_days", "7"),
                ("current", CURRENT_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("daily", DAILY_FIELDS),
                ("temperature_unit", unit.api_value()),
                ("wind_speed_unit", "kmh"),
            ])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ReqwestErrorExt::into_lookup_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpStatus(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))
    }
}
