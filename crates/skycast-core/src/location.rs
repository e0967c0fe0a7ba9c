//! City records and the bounded favorite/recent lists.
//!
//! A `City` can only be built by [`normalize`], which validates raw records
//! from the geocoder or from persisted state. Malformed records yield `None`
//! rather than a half-valid city.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Maximum number of favorite cities kept.
pub const MAX_FAVORITES: usize = 12;

/// Maximum number of recent searches kept.
pub const MAX_RECENT: usize = 8;

/// A geographic place resolved from a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub admin1: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: String,
}

impl City {
    /// Derived identity key: case-insensitive name/country/admin1 plus
    /// coordinates rounded to 4 decimals. Two records with the same key are
    /// the same place regardless of source.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{:.4}|{:.4}",
            self.name.to_lowercase(),
            self.country.to_lowercase(),
            self.admin1.to_lowercase(),
            self.latitude,
            self.longitude,
        )
    }

    /// Display string: "name, admin1, country", skipping empty parts.
    pub fn display_name(&self) -> String {
        let mut out = self.name.clone();
        for part in [&self.admin1, &self.country] {
            if !part.is_empty() {
                out.push_str(", ");
                out.push_str(part);
            }
        }
        out
    }

    pub fn same_place(&self, other: &City) -> bool {
        self.key() == other.key()
    }
}

fn trimmed(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Validate and trim a raw place record (geocoder result or persisted
/// entry). Returns `None` when latitude/longitude is missing or non-finite
/// or the name is empty after trimming.
pub fn normalize(raw: &Value) -> Option<City> {
    let latitude = raw.get("latitude").and_then(Value::as_f64)?;
    let longitude = raw.get("longitude").and_then(Value::as_f64)?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }

    let name = raw.get("name").and_then(Value::as_str)?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    Some(City {
        name,
        country: trimmed(raw, "country"),
        admin1: trimmed(raw, "admin1"),
        latitude,
        longitude,
        timezone: trimmed(raw, "timezone"),
    })
}

/// Stable, first-occurrence-wins deduplication by derived key.
pub fn dedupe(list: Vec<City>) -> Vec<City> {
    let mut seen = HashSet::new();
    list.into_iter().filter(|c| seen.insert(c.key())).collect()
}

/// Prepend `city` to the recent list, dropping any older occurrence and
/// truncating to [`MAX_RECENT`].
pub fn push_recent(recent: &mut Vec<City>, city: City) {
    let key = city.key();
    recent.retain(|c| c.key() != key);
    recent.insert(0, city);
    recent.truncate(MAX_RECENT);
}

/// Add `city` to the front of the favorites list, deduplicating and
/// truncating to [`MAX_FAVORITES`].
pub fn add_favorite(favorites: &mut Vec<City>, city: City) {
    favorites.insert(0, city);
    *favorites = dedupe(std::mem::take(favorites));
    favorites.truncate(MAX_FAVORITES);
}

/// Remove the favorite with the given derived key, if present.
pub fn remove_favorite(favorites: &mut Vec<City>, key: &str) {
    favorites.retain(|c| c.key() != key);
}

pub fn is_favorite(favorites: &[City], city: &City) -> bool {
    let key = city.key();
    favorites.iter().any(|c| c.key() == key)
}

/// Case-insensitive substring search over the display strings of the
/// deduplicated recent + favorite lists (recent first). Fallback for when
/// the remote geocoder returns nothing.
pub fn find_local(query: &str, favorites: &[City], recent: &[City]) -> Option<City> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let pool = dedupe(recent.iter().chain(favorites.iter()).cloned().collect());
    pool.into_iter()
        .find(|city| city.display_name().to_lowercase().contains(&needle))
}
