//! The state store: load, save, availability probing.

use skycast_core::{StoreError, Theme};

use crate::medium::{StorageMedium, STORAGE_KEY};
use crate::schema;
use crate::state::PersistedState;

const PROBE_KEY: &str = "skycast:probe";

/// Owns the persisted document and the medium it lives in.
///
/// A medium that fails its startup probe, or rejects a write mid-session,
/// disables persistence for the rest of the session; the app keeps running
/// on in-memory state.
pub struct StateStore {
    medium: Box<dyn StorageMedium>,
    default_theme: Theme,
    available: bool,
}

impl StateStore {
    /// Open the store over a medium, probing it with a trivial
    /// write-then-delete. A failed probe logs and disables persistence
    /// instead of failing startup.
    pub fn open(mut medium: Box<dyn StorageMedium>, default_theme: Theme) -> Self {
        let available = match medium.set(PROBE_KEY, "1") {
            Ok(()) => {
                medium.delete(PROBE_KEY);
                true
            }
            Err(e) => {
                tracing::warn!("persistence medium unavailable: {e}");
                false
            }
        };

        Self {
            medium,
            default_theme,
            available,
        }
    }

    /// Whether the persistence medium is currently usable.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Load the persisted state. Never fails: missing, unparsable, or
    /// unmigratable data yields defaults (see [`crate::schema`]).
    pub fn load(&self) -> PersistedState {
        if !self.available {
            return PersistedState::defaults(self.default_theme);
        }
        let raw = self.medium.get(STORAGE_KEY);
        schema::decode(raw.as_deref(), self.default_theme)
    }

    /// Serialize and write the state.
    ///
    /// The first rejected write returns `StoreError::WriteRejected` and
    /// flips the store to disabled; every later call is a silent no-op so
    /// the caller can notify the user exactly once.
    pub fn save(&mut self, state: &PersistedState) -> Result<(), StoreError> {
        if !self.available {
            return Ok(());
        }

        let body = match serde_json::to_string(state) {
            Ok(body) => body,
            Err(e) => {
                self.available = false;
                tracing::warn!("failed to serialize persisted state: {e}");
                return Err(StoreError::WriteRejected(e.to_string()));
            }
        };

        match self.medium.set(STORAGE_KEY, &body) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.available = false;
                tracing::warn!("persistence disabled for this session: {e}");
                Err(StoreError::WriteRejected(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::medium::MemoryMedium;
    use crate::state::SCHEMA_VERSION;
    use skycast_core::City;

    fn paris() -> City {
        City {
            name: "Paris".to_string(),
            country: "France".to_string(),
            admin1: "Ile-de-France".to_string(),
            latitude: 48.8566,
            longitude: 2.3522,
            timezone: "Europe/Paris".to_string(),
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut store = StateStore::open(Box::new(MemoryMedium::new()), Theme::Light);
        assert!(store.is_available());

        let mut state = PersistedState::defaults(Theme::Light);
        state.recent.push(paris());
        store.save(&state).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.version, SCHEMA_VERSION);
        assert_eq!(loaded.recent, vec![paris()]);
    }

    #[test]
    fn test_failed_probe_disables_persistence() {
        let mut medium = MemoryMedium::new();
        medium.set_fail_writes(true);
        let mut store = StateStore::open(Box::new(medium), Theme::Dark);

        assert!(!store.is_available());
        // Loads fall back to defaults, saves are no-ops.
        assert_eq!(store.load(), PersistedState::defaults(Theme::Dark));
        assert!(store.save(&PersistedState::defaults(Theme::Dark)).is_ok());
    }

    #[test]
    fn test_write_failure_reported_once() {
        let mut medium = MemoryMedium::new();
        let state = PersistedState::defaults(Theme::Light);

        // Probe succeeds, then the medium fills up.
        let mut store = {
            medium.set_fail_writes(false);
            StateStore::open(Box::new(medium), Theme::Light)
        };
        assert!(store.save(&state).is_ok());

        // Swap in failure mode by exhausting: simulate via a fresh store
        // whose medium rejects after the probe.
        struct FlakyMedium {
            inner: MemoryMedium,
            writes: usize,
        }
        impl StorageMedium for FlakyMedium {
            fn get(&self, key: &str) -> Option<String> {
                self.inner.get(key)
            }
            fn set(&mut self, key: &str, value: &str) -> Result<(), crate::medium::MediumError> {
                self.writes += 1;
                if self.writes > 1 {
                    // Everything after the probe is rejected.
                    return Err(crate::medium::MediumError::WriteRejected("quota".into()));
                }
                self.inner.set(key, value)
            }
            fn delete(&mut self, key: &str) {
                self.inner.delete(key);
            }
        }

        let flaky = FlakyMedium {
            inner: MemoryMedium::new(),
            writes: 0,
        };
        let mut store = StateStore::open(Box::new(flaky), Theme::Light);
        assert!(store.is_available());

        // First rejected write surfaces the error...
        assert!(store.save(&state).is_err());
        assert!(!store.is_available());
        // ...subsequent saves are silent no-ops.
        assert!(store.save(&state).is_ok());
        assert!(store.save(&state).is_ok());
    }

    #[test]
    fn test_load_migrates_v2_document() {
        let raw = serde_json::json!({
            "version": 2,
            "settings": { "theme": "dark" },
            "favorites": [],
            "recent": []
        })
        .to_string();
        let store = StateStore::open(Box::new(MemoryMedium::with_value(raw)), Theme::Light);

        let state = store.load();
        assert_eq!(state.version, SCHEMA_VERSION);
        assert_eq!(state.settings.theme, Theme::Dark);
    }
}
