//! The interactive weather session: input handling, request lifecycle, and
//! state mutation, with outcomes reported as [`SessionEvent`]s.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use skycast_core::{location, City, LookupError, Settings, TemperatureUnit, Theme};
use skycast_store::{PersistedState, StateStore, SCHEMA_VERSION};
use skycast_weather::{build_view, ForecastClient, GeocodingClient, WeatherView};

use crate::coordinator::{supervise, Coordinator, Family};
use crate::events::{NoticeLevel, SessionEvent, SuggestionUpdate};

/// Minimum trimmed query length before autocomplete fires.
pub const AUTOCOMPLETE_MIN: usize = 2;

/// Maximum suggestions offered per lookup.
pub const AUTOCOMPLETE_LIMIT: usize = 8;

/// Quiet period after the last keystroke before the lookup starts.
pub const AUTOCOMPLETE_DELAY: Duration = Duration::from_millis(240);

/// Where the session is in its request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Resolving,
    Fetching,
    Ready,
    Failed,
}

/// Knobs for a single weather fetch.
#[derive(Debug, Clone, Copy, Default)]
struct FetchOptions {
    /// Do not promote the city into the recent list (retries, refreshes,
    /// opening an entry that is already in recent).
    skip_recent: bool,
    /// Suppress the loading status line (background refreshes).
    silent: bool,
}

#[derive(Debug)]
struct SessionState {
    phase: Phase,
    settings: Settings,
    favorites: Vec<City>,
    recent: Vec<City>,
    active_city: Option<City>,
    last_error_city: Option<City>,
    last_view: Option<WeatherView>,
    debounce: Option<CancellationToken>,
}

struct Inner {
    coordinator: Coordinator,
    geocoder: GeocodingClient,
    forecast: ForecastClient,
    events: UnboundedSender<SessionEvent>,
    store: Mutex<StateStore>,
    state: Mutex<SessionState>,
}

/// One interactive session. Methods take `&self` and spawn their async
/// work; progress and results arrive on the event receiver returned by
/// [`WeatherSession::new`].
pub struct WeatherSession {
    inner: Arc<Inner>,
}

impl WeatherSession {
    /// Build a session over an opened store and the two API clients.
    /// Emits the initial settings and list events so the render layer can
    /// paint persisted state before any input arrives.
    pub fn new(
        store: StateStore,
        geocoder: GeocodingClient,
        forecast: ForecastClient,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let persisted = store.load();
        let persistence_available = store.is_available();

        let inner = Arc::new(Inner {
            coordinator: Coordinator::new(),
            geocoder,
            forecast,
            events,
            store: Mutex::new(store),
            state: Mutex::new(SessionState {
                phase: Phase::Idle,
                settings: persisted.settings,
                favorites: persisted.favorites,
                recent: persisted.recent,
                active_city: None,
                last_error_city: None,
                last_view: None,
                debounce: None,
            }),
        });

        {
            let state = inner.state.lock();
            inner.emit(SessionEvent::ThemeChanged(state.settings.theme));
            inner.emit(SessionEvent::UnitChanged(state.settings.unit));
            inner.emit(SessionEvent::FavoritesChanged(state.favorites.clone()));
            inner.emit(SessionEvent::RecentChanged(state.recent.clone()));
        }
        if !persistence_available {
            inner.notice(
                NoticeLevel::Info,
                "Storage is unavailable. Changes will not be saved.",
            );
        }

        (Self { inner }, receiver)
    }

    /// Handle a keystroke in the search box. Queries shorter than
    /// [`AUTOCOMPLETE_MIN`] hide the panel and withdraw any pending or
    /// in-flight lookup; longer queries restart the debounce window.
    pub fn search_input(&self, query: &str) {
        let inner = Arc::clone(&self.inner);
        let trimmed = query.trim().to_string();

        let token = CancellationToken::new();
        {
            let mut state = inner.state.lock();
            if let Some(previous) = state.debounce.take() {
                previous.cancel();
            }
            if trimmed.chars().count() >= AUTOCOMPLETE_MIN {
                state.debounce = Some(token.clone());
            }
        }

        if trimmed.chars().count() < AUTOCOMPLETE_MIN {
            inner.coordinator.invalidate(Family::Search);
            inner.emit(SessionEvent::Suggestions(SuggestionUpdate::Hidden));
            return;
        }

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(AUTOCOMPLETE_DELAY) => {
                    run_autocomplete(inner, trimmed).await;
                }
            }
        });
    }

    /// Submit the search box contents: resolve the query to a city and
    /// fetch its weather. Falls back to saved places when the geocoder has
    /// nothing or is unreachable.
    pub fn submit(&self, query: &str) {
        let inner = Arc::clone(&self.inner);
        let trimmed = query.trim().to_string();

        inner.cancel_debounce();
        inner.emit(SessionEvent::Suggestions(SuggestionUpdate::Hidden));

        if trimmed.is_empty() {
            inner.emit(SessionEvent::Status("Enter a city name.".to_string()));
            return;
        }

        tokio::spawn(async move {
            run_submit(inner, trimmed).await;
        });
    }

    /// A suggestion was picked from the autocomplete panel.
    pub fn select_suggestion(&self, city: City) {
        let inner = Arc::clone(&self.inner);
        inner.cancel_debounce();
        inner.coordinator.invalidate(Family::Search);
        inner.emit(SessionEvent::Suggestions(SuggestionUpdate::Hidden));
        tokio::spawn(async move {
            run_fetch(inner, city, FetchOptions::default()).await;
        });
    }

    /// Open a favorite or recent entry by its derived key. Entries already
    /// in the recent list are not re-promoted.
    pub fn open_saved(&self, key: &str) {
        let inner = Arc::clone(&self.inner);
        let (city, in_recent) = {
            let state = inner.state.lock();
            let from_recent = state.recent.iter().find(|c| c.key() == key).cloned();
            let in_recent = from_recent.is_some();
            let city = from_recent.or_else(|| {
                state.favorites.iter().find(|c| c.key() == key).cloned()
            });
            (city, in_recent)
        };

        let Some(city) = city else {
            tracing::debug!(key, "saved entry no longer exists");
            return;
        };
        tokio::spawn(async move {
            run_fetch(
                inner,
                city,
                FetchOptions {
                    skip_recent: in_recent,
                    silent: false,
                },
            )
            .await;
        });
    }

    /// Fetch weather for an already-resolved city.
    pub fn request_weather(&self, city: City) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            run_fetch(inner, city, FetchOptions::default()).await;
        });
    }

    /// Retry the last failed fetch.
    pub fn retry(&self) {
        let inner = Arc::clone(&self.inner);
        let city = inner.state.lock().last_error_city.clone();
        match city {
            Some(city) => {
                tokio::spawn(async move {
                    run_fetch(
                        inner,
                        city,
                        FetchOptions {
                            skip_recent: true,
                            silent: false,
                        },
                    )
                    .await;
                });
            }
            None => inner.emit(SessionEvent::Status("Search for a city first.".to_string())),
        }
    }

    /// Switch the temperature unit. Persists immediately and refetches the
    /// active city so displayed values match the new unit; the refetch
    /// shows the usual loading status but does not touch the recent list.
    pub fn set_unit(&self, unit: TemperatureUnit) {
        let inner = Arc::clone(&self.inner);
        let active = {
            let mut state = inner.state.lock();
            if state.settings.unit == unit {
                return;
            }
            state.settings.unit = unit;
            state.active_city.clone()
        };
        inner.persist();
        inner.emit(SessionEvent::UnitChanged(unit));

        if let Some(city) = active {
            tokio::spawn(async move {
                run_fetch(
                    inner,
                    city,
                    FetchOptions {
                        skip_recent: true,
                        silent: false,
                    },
                )
                .await;
            });
        }
    }

    /// Switch the visual theme and persist it.
    pub fn set_theme(&self, theme: Theme) {
        {
            let mut state = self.inner.state.lock();
            if state.settings.theme == theme {
                return;
            }
            state.settings.theme = theme;
        }
        self.inner.persist();
        self.inner.emit(SessionEvent::ThemeChanged(theme));
    }

    /// Add or remove a city from favorites.
    pub fn toggle_favorite(&self, city: City) {
        let (favorites, added) = {
            let mut state = self.inner.state.lock();
            let added = if location::is_favorite(&state.favorites, &city) {
                location::remove_favorite(&mut state.favorites, &city.key());
                false
            } else {
                location::add_favorite(&mut state.favorites, city.clone());
                true
            };
            (state.favorites.clone(), added)
        };
        self.inner.persist();
        self.inner.emit(SessionEvent::FavoritesChanged(favorites));
        if added {
            self.inner
                .notice(NoticeLevel::Success, format!("{} added to favorites.", city.name));
        } else {
            self.inner
                .notice(NoticeLevel::Info, format!("{} removed from favorites.", city.name));
        }
    }

    /// Remove a favorite by derived key.
    pub fn remove_favorite(&self, key: &str) {
        let favorites = {
            let mut state = self.inner.state.lock();
            location::remove_favorite(&mut state.favorites, key);
            state.favorites.clone()
        };
        self.inner.persist();
        self.inner.emit(SessionEvent::FavoritesChanged(favorites));
    }

    /// Remove a recent entry by derived key.
    pub fn remove_recent(&self, key: &str) {
        let recent = {
            let mut state = self.inner.state.lock();
            state.recent.retain(|c| c.key() != key);
            state.recent.clone()
        };
        self.inner.persist();
        self.inner.emit(SessionEvent::RecentChanged(recent));
    }

    /// Reopen the most recent city, if any. Used on startup to restore the
    /// previous session's view without disturbing the recent order.
    pub fn restore_last(&self) {
        let inner = Arc::clone(&self.inner);
        let Some(city) = inner.state.lock().recent.first().cloned() else {
            return;
        };
        tokio::spawn(async move {
            run_fetch(
                inner,
                city,
                FetchOptions {
                    skip_recent: true,
                    silent: true,
                },
            )
            .await;
        });
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    pub fn settings(&self) -> Settings {
        self.inner.state.lock().settings
    }

    pub fn favorites(&self) -> Vec<City> {
        self.inner.state.lock().favorites.clone()
    }

    pub fn recent(&self) -> Vec<City> {
        self.inner.state.lock().recent.clone()
    }

    pub fn last_view(&self) -> Option<WeatherView> {
        self.inner.state.lock().last_view.clone()
    }
}

impl Inner {
    fn emit(&self, event: SessionEvent) {
        // A dropped receiver means the render layer went away; nothing
        // useful to do with the event then.
        let _ = self.events.send(event);
    }

    fn notice(&self, level: NoticeLevel, text: impl Into<String>) {
        self.emit(SessionEvent::Notice {
            level,
            text: text.into(),
        });
    }

    fn cancel_debounce(&self) {
        if let Some(token) = self.state.lock().debounce.take() {
            token.cancel();
        }
    }

    /// Snapshot the session state and write it through the store. The
    /// store reports a rejected write exactly once; that one error becomes
    /// a user-visible notice.
    fn persist(&self) {
        let snapshot = {
            let state = self.state.lock();
            PersistedState {
                version: SCHEMA_VERSION,
                settings: state.settings,
                favorites: state.favorites.clone(),
                recent: state.recent.clone(),
            }
        };
        let result = self.store.lock().save(&snapshot);
        if let Err(e) = result {
            tracing::warn!("persist failed: {e}");
            self.notice(NoticeLevel::Error, e.user_message());
        }
    }
}

async fn run_autocomplete(inner: Arc<Inner>, query: String) {
    let ticket = inner.coordinator.begin(Family::Search);
    inner.emit(SessionEvent::Suggestions(SuggestionUpdate::Searching));

    let result = supervise(&ticket, inner.geocoder.search(&query, AUTOCOMPLETE_LIMIT)).await;
    if !inner.coordinator.is_current(&ticket) {
        return;
    }

    match result {
        Ok(cities) if cities.is_empty() => {
            inner.emit(SessionEvent::Suggestions(SuggestionUpdate::Empty));
        }
        Ok(cities) => {
            inner.emit(SessionEvent::Suggestions(SuggestionUpdate::Results(cities)));
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => {
            // Autocomplete failures degrade quietly; submit still works.
            tracing::warn!(query, "autocomplete lookup failed: {e}");
            inner.emit(SessionEvent::Suggestions(SuggestionUpdate::Unavailable));
        }
    }
}

async fn run_submit(inner: Arc<Inner>, query: String) {
    inner.state.lock().phase = Phase::Resolving;

    let ticket = inner.coordinator.begin(Family::Search);
    let result = supervise(&ticket, inner.geocoder.search(&query, 1)).await;
    if !inner.coordinator.is_current(&ticket) {
        return;
    }

    let remote = match result {
        Ok(cities) => cities.into_iter().next(),
        Err(e) if e.is_cancelled() => return,
        Err(e) => {
            tracing::warn!(query, "geocoding failed, trying saved places: {e}");
            inner.notice(NoticeLevel::Error, "City lookup failed.");
            None
        }
    };

    let resolved = remote.or_else(|| {
        let state = inner.state.lock();
        location::find_local(&query, &state.favorites, &state.recent)
    });

    match resolved {
        Some(city) => run_fetch(inner, city, FetchOptions::default()).await,
        None => {
            inner.state.lock().phase = Phase::Idle;
            inner.emit(SessionEvent::NoMatch);
            inner.emit(SessionEvent::Status(
                LookupError::NoMatch.user_message().to_string(),
            ));
        }
    }
}

async fn run_fetch(inner: Arc<Inner>, city: City, opts: FetchOptions) {
    let ticket = inner.coordinator.begin(Family::Weather);
    let unit = {
        let mut state = inner.state.lock();
        state.phase = Phase::Fetching;
        state.active_city = Some(city.clone());
        state.last_error_city = Some(city.clone());
        state.settings.unit
    };

    if !opts.silent {
        inner.emit(SessionEvent::Loading { city: city.clone() });
        inner.emit(SessionEvent::Status(format!(
            "Loading weather for {}...",
            city.display_name()
        )));
    }

    let result = supervise(&ticket, async {
        let payload = inner.forecast.fetch(&city, unit).await?;
        build_view(&city, unit, &payload)
    })
    .await;

    if !inner.coordinator.is_current(&ticket) {
        return;
    }

    match result {
        Ok(view) => {
            let recent = {
                let mut state = inner.state.lock();
                state.phase = Phase::Ready;
                state.last_error_city = None;
                state.last_view = Some(view.clone());
                if opts.skip_recent {
                    None
                } else {
                    location::push_recent(&mut state.recent, city.clone());
                    Some(state.recent.clone())
                }
            };
            if let Some(recent) = recent {
                inner.persist();
                inner.emit(SessionEvent::RecentChanged(recent));
            }
            inner.emit(SessionEvent::Ready(Box::new(view)));
            inner.emit(SessionEvent::Status(format!(
                "Showing weather for {}.",
                city.display_name()
            )));
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => {
            tracing::warn!(city = %city.display_name(), "weather fetch failed: {e}");
            inner.state.lock().phase = Phase::Failed;
            inner.emit(SessionEvent::Failed {
                kind: e.kind(),
                message: e.user_message().to_string(),
            });
            inner.emit(SessionEvent::Status(
                "Unable to load weather right now.".to_string(),
            ));
            inner.notice(NoticeLevel::Error, "Could not load weather data.");
        }
    }
}
