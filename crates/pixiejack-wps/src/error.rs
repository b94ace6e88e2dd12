//! Error types for WPS PIN and session logic.

use thiserror::Error;

/// Result type alias for WPS operations.
pub type Result<T> = std::result::Result<T, WpsError>;

/// Error type for WPS operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WpsError {
    /// Hardware address could not be parsed.
    #[error("Invalid MAC address: {0}")]
    InvalidAddress(String),

    /// PIN string is not a usable WPS PIN.
    #[error("Invalid WPS PIN: {0}")]
    InvalidPin(String),
}

impl WpsError {
    /// Every WPS logic error ends the current attempt only.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }
}
