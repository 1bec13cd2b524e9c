// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid virtual host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("Invalid instance: {0}")]
    InvalidInstance(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
