// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Probe failures carry the address of the offending instance so the
/// scheduler's logs identify which leg of the proxy failed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Could not build system ports request for instance with IP {address}: {reason}")]
    RequestConstruction { address: String, reason: String },

    #[error("Could not get system ports of instance with IP {address}: {source}")]
    Transport {
        address: String,
        #[source]
        source: crate::port::TransportError,
    },

    #[error("Could not get system ports of instance with IP {address}. Got status code: {status}")]
    UnexpectedStatus { address: String, status: u16 },

    #[error("Could not decode system ports of instance with IP {address}: {source}")]
    Decode {
        address: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("System ports request for instance with IP {address} was cancelled")]
    Cancelled { address: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// True when the invocation was aborted by its caller
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled { .. })
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
