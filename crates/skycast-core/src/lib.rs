//! Core types for Skycast: city records, user settings, and the
//! categorized error hierarchy shared by the store, weather, and
//! session crates.

pub mod error;
pub mod location;
pub mod settings;

pub use error::{ErrorKind, LookupError, ReqwestErrorExt, StoreError};
pub use location::{City, MAX_FAVORITES, MAX_RECENT};
pub use settings::{Settings, TemperatureUnit, Theme};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Skycast core initialized");
    Ok(())
}
