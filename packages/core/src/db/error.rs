//! Storage Error Types
//!
//! This module defines error types for the key-value store and the JSON
//! collections written through it.

use thiserror::Error;

/// Storage operation errors
///
/// Covers reading, writing, and decoding collections. Missing keys are not
/// errors; they load as empty collections.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing medium failed
    #[error("I/O failure for key '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    /// A stored value could not be encoded or decoded as JSON
    #[error("Serialization failure for key '{key}': {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },

    /// A store lock was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    LockPoisoned(String),

    /// The store cannot use the given key
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// Create an I/O error for a key
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    /// Create a serialization error for a key
    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }

    /// Create a lock poisoned error
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        Self::LockPoisoned(msg.into())
    }

    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }
}
