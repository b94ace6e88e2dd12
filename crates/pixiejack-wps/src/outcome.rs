//! Result bookkeeping for a single registration attempt.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Attempt status as derived from supplicant events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    InProgress,
    /// AP answered with WSC_NACK (wrong PIN or locked)
    PeerRejected,
    /// Network key received
    CredentialsRecovered,
    /// Supplicant reported WPS-FAIL
    ProtocolFailed,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::InProgress => write!(f, "IN_PROGRESS"),
            SessionStatus::PeerRejected => write!(f, "WSC_NACK"),
            SessionStatus::CredentialsRecovered => write!(f, "GOT_PSK"),
            SessionStatus::ProtocolFailed => write!(f, "WPS_FAIL"),
        }
    }
}

/// Live outcome of the current attempt.
///
/// The first terminal status wins; later events in the same attempt are
/// ignored until [`SessionOutcome::clear`] starts a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    status: SessionStatus,
    /// Last M-message number seen, for progress only
    pub last_message: u8,
    pub essid: String,
    pub psk: String,
}

impl SessionOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a status transition. Returns false when the attempt was
    /// already terminal and the transition was dropped.
    pub fn transition(&mut self, status: SessionStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }

    /// Record the recovered passphrase and finish the attempt.
    pub fn record_psk(&mut self, psk: impl Into<String>) -> bool {
        if !self.transition(SessionStatus::CredentialsRecovered) {
            return false;
        }
        self.psk = psk.into();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_outcome_in_progress() {
        let outcome = SessionOutcome::new();
        assert_eq!(outcome.status(), SessionStatus::InProgress);
        assert!(!outcome.is_terminal());
    }

    #[test]
    fn test_first_terminal_status_wins() {
        let mut outcome = SessionOutcome::new();
        assert!(outcome.transition(SessionStatus::ProtocolFailed));
        assert!(!outcome.transition(SessionStatus::PeerRejected));
        assert!(!outcome.record_psk("secret"));
        assert_eq!(outcome.status(), SessionStatus::ProtocolFailed);
        assert!(outcome.psk.is_empty());
    }

    #[test]
    fn test_record_psk() {
        let mut outcome = SessionOutcome::new();
        assert!(outcome.record_psk("hello"));
        assert_eq!(outcome.status(), SessionStatus::CredentialsRecovered);
        assert_eq!(outcome.psk, "hello");
    }

    #[test]
    fn test_clear_allows_new_attempt() {
        let mut outcome = SessionOutcome::new();
        outcome.transition(SessionStatus::PeerRejected);
        outcome.essid = "lab".to_string();
        outcome.clear();
        assert_eq!(outcome, SessionOutcome::default());
        assert!(outcome.transition(SessionStatus::ProtocolFailed));
    }

    #[test]
    fn test_terminal_status_survives_serialization() {
        let mut outcome = SessionOutcome::new();
        outcome.record_psk("hello");
        let json = serde_json::to_string(&outcome).unwrap();
        let restored: SessionOutcome = serde_json::from_str(&json).unwrap();
        assert!(restored.is_terminal());
        assert_eq!(restored, outcome);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::PeerRejected.to_string(), "WSC_NACK");
        assert_eq!(SessionStatus::CredentialsRecovered.to_string(), "GOT_PSK");
    }
}
