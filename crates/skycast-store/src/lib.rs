//! Persisted client state for Skycast.
//!
//! One JSON document under one key of a key-value medium holds everything
//! that survives a session: settings, favorites, recent searches. Loads
//! never fail; writes degrade gracefully when the medium rejects them.

pub mod medium;
pub mod schema;
pub mod state;
pub mod store;

pub use medium::{FileMedium, MediumError, MemoryMedium, StorageMedium, STORAGE_KEY};
pub use state::{PersistedState, SCHEMA_VERSION};
pub use store::StateStore;
