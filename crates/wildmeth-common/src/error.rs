//! Error types for wildmeth

use thiserror::Error;

/// Result type alias for wildmeth operations
pub type Result<T> = std::result::Result<T, WildmethError>;

/// Main error type for wildmeth
#[derive(Error, Debug)]
pub enum WildmethError {
    #[error("Invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("Invalid taxonomy ID: {0}")]
    InvalidTaxId(String),

    #[error("Invalid data URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
