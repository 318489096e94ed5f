//! Error types for nft-dump
//!
//! Two layers of errors exist:
//! - [`Error`] for run-fatal problems (configuration, supply resolution, persistence)
//! - [`FetchError`] for a single token lookup; these are stored as data inside
//!   [`FetchOutcome::Failure`](crate::types::FetchOutcome::Failure) and never abort a run

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nft-dump operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nft-dump
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency")
        key: Option<String>,
    },

    /// The total supply could not be determined; nothing was fetched
    #[error("total supply unavailable for {address}: {reason}")]
    SupplyUnavailable {
        /// Contract address whose supply was requested
        address: String,
        /// Why the supply lookup failed
        reason: String,
    },

    /// The aggregate was collected but could not be persisted
    #[error("failed to write aggregate to {}: {source}", path.display())]
    AggregateWrite {
        /// Destination that could not be written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The remote API answered with an error payload or unexpected status
    #[error("remote API error: {0}")]
    Remote(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::SupplyUnavailable { .. } => "supply_unavailable",
            Error::AggregateWrite { .. } => "aggregate_write_failed",
            Error::Remote(_) => "remote_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Process exit code used by the command-line front end
    pub fn exit_code(&self) -> i32 {
        match self {
            // usage / configuration
            Error::Config { .. } => 2,
            // nothing was fetched
            Error::SupplyUnavailable { .. } | Error::Remote(_) | Error::Network(_) => 3,
            // fetched but not persisted
            Error::AggregateWrite { .. } | Error::Serialization(_) => 4,
        }
    }
}

/// Failure of a single token lookup
///
/// Cloneable and serializable so it can travel inside outcomes and events.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("request failed: {message}")]
    Network {
        /// Transport error description
        message: String,
    },

    /// The server responded with a non-success status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The response body was not valid metadata JSON
    #[error("invalid response body: {message}")]
    Decode {
        /// Decoder error description
        message: String,
    },
}

impl FetchError {
    /// Whether the remote API rejected the request (4xx/5xx)
    pub fn is_status(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FetchError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_decode() {
            FetchError::Decode {
                message: e.to_string(),
            }
        } else {
            FetchError::Network {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode {
            message: e.to_string(),
        }
    }
}
