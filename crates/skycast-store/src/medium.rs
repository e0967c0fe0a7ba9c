//! Key-value persistence medium abstraction.
//!
//! The store owns exactly one string-valued key. Reads are infallible from
//! the caller's point of view (missing data is `None`); writes can be
//! rejected by the medium (quota) and must be handled by the caller.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

/// The single key owned by this application.
pub const STORAGE_KEY: &str = "skycast:store";

/// Errors raised by a persistence medium.
#[derive(Debug, Error)]
pub enum MediumError {
    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// Synchronous string key-value storage with fallible writes.
pub trait StorageMedium: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), MediumError>;
    fn delete(&mut self, key: &str);
}

/// File-backed medium: each key maps to one file in a base directory.
#[derive(Debug)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys may contain separators that are not filename-safe.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl StorageMedium for FileMedium {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), MediumError> {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            return Err(MediumError::WriteRejected(e.to_string()));
        }
        std::fs::write(self.path_for(key), value)
            .map_err(|e| MediumError::WriteRejected(e.to_string()))
    }

    fn delete(&mut self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}

/// In-memory medium, with write fault injection for tests.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the owned key with a raw document.
    pub fn with_value(raw: impl Into<String>) -> Self {
        let mut medium = Self::default();
        medium.entries.insert(STORAGE_KEY.to_string(), raw.into());
        medium
    }

    /// Make every subsequent write fail, simulating a full medium.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl StorageMedium for MemoryMedium {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), MediumError> {
        if self.fail_writes {
            return Err(MediumError::WriteRejected("quota exceeded".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let mut medium = MemoryMedium::new();
        assert!(medium.get(STORAGE_KEY).is_none());
        medium.set(STORAGE_KEY, "{}").unwrap();
        assert_eq!(medium.get(STORAGE_KEY).as_deref(), Some("{}"));
        medium.delete(STORAGE_KEY);
        assert!(medium.get(STORAGE_KEY).is_none());
    }

    #[test]
    fn test_memory_fault_injection() {
        let mut medium = MemoryMedium::new();
        medium.set_fail_writes(true);
        assert!(medium.set(STORAGE_KEY, "{}").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = FileMedium::new(dir.path());
        medium.set(STORAGE_KEY, "hello").unwrap();
        assert_eq!(medium.get(STORAGE_KEY).as_deref(), Some("hello"));
        medium.delete(STORAGE_KEY);
        assert!(medium.get(STORAGE_KEY).is_none());
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = FileMedium::new(dir.path());
        medium.set(STORAGE_KEY, "x").unwrap();
        assert!(dir.path().join("skycast_store.json").exists());
    }
}
