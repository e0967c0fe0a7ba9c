//! Weather and geocoding clients for Skycast, built on the Open-Meteo
//! APIs, plus payload validation and the render-ready view model.

pub mod forecast;
pub mod format;
pub mod geocode;
pub mod labels;
pub mod payload;
pub mod view;

pub use forecast::ForecastClient;
pub use geocode::GeocodingClient;
pub use payload::{build_view, validate_payload};
pub use view::{
    hourly_window, Atmosphere, ChartPoint, CurrentConditions, DailyEntry, HourlySeries,
    WeatherView,
};
