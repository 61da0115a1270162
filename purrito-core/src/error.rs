//! Error types for the Purrito core library.

use thiserror::Error;

/// Top-level error type for all Purrito operations.
///
/// Gameplay rejections (wrong target, cooldowns, an absent pet) are never
/// errors; they come back as ordinary outcome text. This type only covers
/// the machinery underneath.
#[derive(Error, Debug)]
pub enum PurritoError {
    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record store backend failed for a reason other than SQLite.
    #[error("Record store error: {0}")]
    Store(String),

    /// A stored timestamp could not be parsed back.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The raw stored value.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PurritoError>;
