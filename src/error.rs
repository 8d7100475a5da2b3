//! Error Types
//!
//! Defines the error type shared across the networking core. These cover the
//! few surfaces that report failures at all: storage backends, connectivity
//! sources, and request serialization.
//!
//! The operational surfaces (queueing, draining, status reads) absorb
//! expected failures instead of returning them: a broken store reads as an
//! empty queue, a failed send becomes a count in the drain report, a failed
//! startup fetch leaves the monitor at indeterminate defaults. Callers read
//! outcomes, not exceptions.

use thiserror::Error;

/// Errors raised by the networking core
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Persistent storage read or write failure
    #[error("storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization failure
    #[error("serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },

    /// HTTP transport failure
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },
}

impl NetworkError {
    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}
