//! Events the session emits toward the render layer.

use skycast_core::{City, ErrorKind, TemperatureUnit, Theme};
use skycast_weather::WeatherView;

/// Autocomplete panel state.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionUpdate {
    /// A lookup is running; show the searching indicator.
    Searching,
    /// Candidates to offer, already deduplicated and capped.
    Results(Vec<City>),
    /// The lookup finished with nothing to offer.
    Empty,
    /// The lookup failed; autocomplete degrades quietly.
    Unavailable,
    /// Hide the panel entirely.
    Hidden,
}

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// One render-layer instruction. Events are emitted in the order state
/// changes happen; consuming them in order reproduces the session's view.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Suggestions(SuggestionUpdate),
    /// One-line status text under the search box.
    Status(String),
    /// A weather fetch started for this city.
    Loading { city: City },
    /// A fetch succeeded; replace the rendered view wholesale.
    Ready(Box<WeatherView>),
    /// A fetch or lookup failed with a user-visible category.
    Failed { kind: ErrorKind, message: String },
    /// A search resolved to no place at all; informational, not a failure.
    NoMatch,
    FavoritesChanged(Vec<City>),
    RecentChanged(Vec<City>),
    ThemeChanged(Theme),
    UnitChanged(TemperatureUnit),
    /// Transient toast-style notice.
    Notice { level: NoticeLevel, text: String },
}
