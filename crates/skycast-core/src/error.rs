//! Centralized error types for the Skycast core.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for UI display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Coarse error category, used by the render layer to pick styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    Cancelled,
    HttpStatus,
    InvalidResponse,
    IncompleteData,
    NoMatch,
}

/// Errors produced while resolving a city or fetching its forecast.
///
/// `Cancelled` must never reach the user: superseded or externally aborted
/// operations are swallowed at the coordinator boundary. `NoMatch` is an
/// informational outcome (empty search), not a failure.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("network request failed: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("request aborted")]
    Cancelled,

    #[error("service responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    #[error("incomplete weather data: {0}")]
    IncompleteData(String),

    #[error("no matching place")]
    NoMatch,
}

impl LookupError {
    /// Returns a user-friendly message suitable for display in the UI.
    ///
    /// Raw technical detail stays in the `Display` impl for logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::Network(_) => "Network request failed. Check your connection.",
            LookupError::Timeout => "Weather request timed out. Please retry.",
            LookupError::Cancelled => "Request was cancelled.",
            LookupError::HttpStatus(_) => {
                "Weather service returned an error. Please retry shortly."
            }
            LookupError::InvalidResponse(_) => "Weather service response was invalid.",
            LookupError::IncompleteData(_) => {
                "Could not load weather right now. Please try again."
            }
            LookupError::NoMatch => "No matching city found.",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::Network(_) => ErrorKind::Network,
            LookupError::Timeout => ErrorKind::Timeout,
            LookupError::Cancelled => ErrorKind::Cancelled,
            LookupError::HttpStatus(_) => ErrorKind::HttpStatus,
            LookupError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            LookupError::IncompleteData(_) => ErrorKind::IncompleteData,
            LookupError::NoMatch => ErrorKind::NoMatch,
        }
    }

    /// True for superseded/aborted operations that must stay invisible.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LookupError::Cancelled)
    }

    /// True for the empty-result outcome, which gets informational styling
    /// rather than failure styling.
    pub fn is_informational(&self) -> bool {
        matches!(self, LookupError::NoMatch)
    }
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The medium rejected a write (quota). Reported once per session;
    /// later saves degrade to no-ops.
    #[error("storage write rejected: {0}")]
    WriteRejected(String),
}

impl StoreError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StoreError::WriteRejected(_) => "Storage quota reached. New changes are temporary.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_lookup_error(self) -> LookupError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_lookup_error(self) -> LookupError {
        if self.is_timeout() {
            LookupError::Timeout
        } else if self.is_decode() {
            LookupError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            LookupError::HttpStatus(status.as_u16())
        } else {
            LookupError::Network(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_by_kind() {
        assert_eq!(
            LookupError::Timeout.user_message(),
            "Weather request timed out. Please retry."
        );
        assert_eq!(
            LookupError::Network("refused".into()).user_message(),
            "Network request failed. Check your connection."
        );
        assert_eq!(
            LookupError::HttpStatus(503).user_message(),
            "Weather service returned an error. Please retry shortly."
        );
    }

    #[test]
    fn test_cancelled_is_not_informational() {
        assert!(LookupError::Cancelled.is_cancelled());
        assert!(!LookupError::Cancelled.is_informational());
        assert!(LookupError::NoMatch.is_informational());
        assert!(!LookupError::NoMatch.is_cancelled());
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(LookupError::Timeout.kind(), ErrorKind::Timeout);
        assert_eq!(
            LookupError::IncompleteData("daily".into()).kind(),
            ErrorKind::IncompleteData
        );
    }

    #[test]
    fn test_store_error_message() {
        let err = StoreError::WriteRejected("quota".into());
        assert!(err.user_message().contains("quota"));
    }
}
