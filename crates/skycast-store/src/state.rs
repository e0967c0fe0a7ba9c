//! The persisted state document.

use serde::{Deserialize, Serialize};

use skycast_core::{City, Settings, Theme};

/// Current schema version written to disk.
pub const SCHEMA_VERSION: u32 = 3;

/// Everything that survives a session. Single source of truth, owned by
/// [`crate::StateStore`]; the rest of the app holds copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub settings: Settings,
    pub favorites: Vec<City>,
    pub recent: Vec<City>,
}

impl PersistedState {
    /// First-run defaults: host-preferred theme, celsius, empty lists.
    pub fn defaults(theme: Theme) -> Self {
        Self {
            version: SCHEMA_VERSION,
            settings: Settings {
                theme,
                ..Settings::default()
            },
            favorites: Vec::new(),
            recent: Vec::new(),
        }
    }
}
