//! Error types for the config generator
//!
//! Every failure path of a run maps onto one of these variants. Endpoint-local
//! failures ([`Error::MissingKey`], [`Error::Resolution`]) are skippable; all
//! others end the run.

use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the config generator
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Endpoint directory could not be retrieved or decoded
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Filters left no candidate endpoint
    #[error("Could not find any online wireguard endpoint matching {filter}")]
    NoMatch {
        /// Human-readable description of the active filters
        filter: String,
    },

    /// Endpoint has no usable wireguard public key
    #[error("Endpoint {endpoint} has no wireguard public key")]
    MissingKey {
        /// Endpoint display name
        endpoint: String,
    },

    /// Hostname pre-resolution failed
    #[error("Failed to resolve {hostname}: {reason}")]
    Resolution {
        /// Hostname that was looked up
        hostname: String,
        /// Underlying failure
        reason: String,
    },

    /// Candidates existed but every one of them was skipped
    #[error("None of the {matched} matching endpoint(s) could be rendered")]
    NothingRendered {
        /// Number of endpoints that passed the filters
        matched: usize,
    },

    /// Writing a rendered configuration failed
    #[error("Output error: {0}")]
    Output(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a no-match error naming the attempted filter
    pub fn no_match(filter: impl Into<String>) -> Self {
        Self::NoMatch {
            filter: filter.into(),
        }
    }

    /// Create a missing-key error
    pub fn missing_key(endpoint: impl Into<String>) -> Self {
        Self::MissingKey {
            endpoint: endpoint.into(),
        }
    }

    /// Create a resolution error
    pub fn resolution(hostname: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            hostname: hostname.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Whether the error only concerns a single endpoint.
    ///
    /// Skippable errors are logged and the run moves on to the next
    /// candidate without consuming an output slot.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::MissingKey { .. } | Self::Resolution { .. })
    }
}
