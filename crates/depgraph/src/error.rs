//! Error types for depgraph operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.
//! Conditions the engine treats as reportable outcomes (rejected cycles, views
//! without roots) are not errors and never surface here.

use thiserror::Error;

/// Result type alias for depgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Comprehensive error type for all graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Storage backend error (RocksDB, file I/O, etc.)
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A version specifier could not be parsed.
    #[error("Invalid version in '{coordinate}': {reason}")]
    InvalidVersion {
        /// Coordinate carrying the bad version
        coordinate: String,
        /// Why parsing failed
        reason: String,
    },

    /// A `group:artifact[:version]` string was malformed.
    #[error("Invalid coordinate: '{value}'")]
    InvalidCoordinate {
        /// The offending input
        value: String,
    },

    /// The graph was closed; no further operations are accepted.
    #[error("Graph connection is closed")]
    ConnectionClosed,

    /// Configuration could not be loaded or is inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },
}

impl GraphError {
    /// Create a storage error from a message and optional source.
    pub fn storage<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create an invalid-version error for the given coordinate.
    pub fn invalid_version(coordinate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            coordinate: coordinate.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call could ever succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::Storage { .. })
    }
}
