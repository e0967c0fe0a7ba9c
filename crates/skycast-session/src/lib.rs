//! Session orchestration for Skycast: debounced autocomplete, search
//! submission, weather fetches with latest-request-wins coordination, and
//! persisted favorites/recent/settings.

pub mod coordinator;
pub mod events;
pub mod session;

pub use coordinator::{Coordinator, Family, Ticket, REQUEST_TIMEOUT};
pub use events::{NoticeLevel, SessionEvent, SuggestionUpdate};
pub use session::{
    Phase, WeatherSession, AUTOCOMPLETE_DELAY, AUTOCOMPLETE_LIMIT, AUTOCOMPLETE_MIN,
};
