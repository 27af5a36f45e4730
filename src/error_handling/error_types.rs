// src/error_handling/error_types.rs
//! Error types for solana-pulse
//!
//! Every failure the pipeline can surface is transient by assumption: the
//! caller is expected to retry on the next poll tick. Unknown identifiers and
//! empty block windows are never errors.

use thiserror::Error;

/// Failure reported by a ledger data source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success HTTP status
    #[error("HTTP error from {url}: {status}")]
    Http { url: String, status: u16 },

    /// The endpoint answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// JSON-RPC error code, if the endpoint reported one
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            SourceError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum PulseError {
    /// One of the data fetches failed; no partial snapshot is produced
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PulseError {
    /// Whether retrying on the next scheduled snapshot can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PulseError::SourceUnavailable(_))
    }
}

/// Result alias used throughout the crate
pub type PulseResult<T> = Result<T, PulseError>;
