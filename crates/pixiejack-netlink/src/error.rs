use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for pixiejack-netlink operations.
///
/// Messages name the external tool or socket involved so the operator can
/// act on them directly.
#[derive(Error, Debug)]
pub enum NetlinkError {
    #[error("Failed to launch {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("wpa_supplicant control socket {path:?} did not appear within {timeout_ms}ms")]
    StartupTimeout { path: PathBuf, timeout_ms: u64 },

    #[error("wpa_supplicant exited before becoming ready: {0}")]
    SupplicantExited(String),

    #[error("Control socket error at {path:?}: {reason}")]
    ControlSocket { path: PathBuf, reason: String },

    #[error("wpa_supplicant rejected '{command}': {reply}")]
    CommandRejected { command: String, reply: String },

    #[error("Pixie Dust recovery unavailable: {0}")]
    RecoveryUnavailable(String),

    #[error("Wireless scan unavailable on '{interface}': {reason}")]
    ScanUnavailable { interface: String, reason: String },

    #[error("Failed to bring up interface '{interface}': {reason}")]
    InterfaceUp { interface: String, reason: String },

    #[error("Permission denied: {0}. Run as root")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wps(#[from] pixiejack_wps::WpsError),
}

impl NetlinkError {
    /// Whether the caller can continue after reporting this error.
    ///
    /// Only missing privileges end the process; everything else ends the
    /// current attempt.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NetlinkError::PermissionDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, NetlinkError>;
