//! Versioned decoding of the persisted document.
//!
//! The on-disk document carries a numeric `version` field. Each recognized
//! prior version has one explicit upgrade function landing on the current
//! snapshot; anything unrecognized or unparsable falls back to defaults.
//! Decoding works field-by-field over loose JSON so a single corrupt
//! sub-field degrades to its default instead of failing the whole load.

use serde_json::Value;

use skycast_core::{location, Settings, TemperatureUnit, Theme};

use crate::state::{PersistedState, SCHEMA_VERSION};

/// A recognized raw snapshot, before city normalization.
#[derive(Debug)]
enum Snapshot {
    V2(RawDocument),
    V3(RawDocument),
}

/// Loosely-typed document contents shared by all known versions.
#[derive(Debug)]
struct RawDocument {
    theme: Option<String>,
    unit: Option<String>,
    favorites: Vec<Value>,
    recent: Vec<Value>,
}

fn raw_document(value: &Value) -> RawDocument {
    let list = |field: &str| {
        value
            .get(field)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let setting = |field: &str| {
        value
            .pointer(&format!("/settings/{field}"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    RawDocument {
        theme: setting("theme"),
        unit: setting("unit"),
        favorites: list("favorites"),
        recent: list("recent"),
    }
}

fn detect(value: &Value) -> Option<Snapshot> {
    match value.get("version").and_then(Value::as_u64) {
        Some(3) => Some(Snapshot::V3(raw_document(value))),
        Some(2) => Some(Snapshot::V2(raw_document(value))),
        _ => None,
    }
}

/// v2 → v3: same field layout, but theme falls back to the host-preferred
/// default rather than light when unrecognized.
fn upgrade_v2(doc: RawDocument, default_theme: Theme) -> PersistedState {
    let theme = match doc.theme.as_deref() {
        Some("dark") => Theme::Dark,
        _ => default_theme,
    };
    finalize(doc, theme)
}

fn current(doc: RawDocument) -> PersistedState {
    let theme = match doc.theme.as_deref() {
        Some("dark") => Theme::Dark,
        _ => Theme::Light,
    };
    finalize(doc, theme)
}

/// Re-normalize, dedupe and cap the city lists; drop entries that fail
/// normalization (corrupt or legacy records).
fn finalize(doc: RawDocument, theme: Theme) -> PersistedState {
    let unit = match doc.unit.as_deref() {
        Some("fahrenheit") => TemperatureUnit::Fahrenheit,
        _ => TemperatureUnit::Celsius,
    };

    let rebuild = |entries: &[Value], cap: usize| {
        let mut cities =
            location::dedupe(entries.iter().filter_map(location::normalize).collect());
        cities.truncate(cap);
        cities
    };

    PersistedState {
        version: SCHEMA_VERSION,
        settings: Settings { theme, unit },
        favorites: rebuild(&doc.favorites, skycast_core::MAX_FAVORITES),
        recent: rebuild(&doc.recent, skycast_core::MAX_RECENT),
    }
}

/// Decode a raw persisted document. Missing, unparsable, or
/// unrecognized-version data yields defaults.
pub fn decode(raw: Option<&str>, default_theme: Theme) -> PersistedState {
    let Some(raw) = raw else {
        return PersistedState::defaults(default_theme);
    };

    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!("persisted state unparsable, using defaults");
        return PersistedState::defaults(default_theme);
    };

    match detect(&value) {
        Some(Snapshot::V3(doc)) => current(doc),
        Some(Snapshot::V2(doc)) => upgrade_v2(doc, default_theme),
        None => {
            tracing::debug!("unrecognized persisted schema version, using defaults");
            PersistedState::defaults(default_theme)
        }
    }
}
