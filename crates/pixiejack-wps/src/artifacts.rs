//! Handshake values needed for offline Pixie Dust PIN recovery.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The six hexdump artifacts logged by the supplicant during M1-M3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Enrollee (AP) Diffie-Hellman public key
    PeerPublicKey,
    /// Registrar (our) Diffie-Hellman public key
    OwnPublicKey,
    EnrolleeNonce,
    AuthKey,
    EHash1,
    EHash2,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::PeerPublicKey,
        ArtifactKind::OwnPublicKey,
        ArtifactKind::EnrolleeNonce,
        ArtifactKind::AuthKey,
        ArtifactKind::EHash1,
        ArtifactKind::EHash2,
    ];

    /// Recovery utility flag carrying this value.
    #[must_use]
    pub fn flag(&self) -> &'static str {
        match self {
            ArtifactKind::PeerPublicKey => "--pke",
            ArtifactKind::OwnPublicKey => "--pkr",
            ArtifactKind::EnrolleeNonce => "--e-nonce",
            ArtifactKind::AuthKey => "--authkey",
            ArtifactKind::EHash1 => "--e-hash1",
            ArtifactKind::EHash2 => "--e-hash2",
        }
    }

    /// Short label used in operator feedback.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactKind::PeerPublicKey => "PKE",
            ArtifactKind::OwnPublicKey => "PKR",
            ArtifactKind::EnrolleeNonce => "E-Nonce",
            ArtifactKind::AuthKey => "AuthKey",
            ArtifactKind::EHash1 => "E-Hash1",
            ArtifactKind::EHash2 => "E-Hash2",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Artifacts collected during one registration attempt.
///
/// Cleared before every attempt so values from a previous exchange can
/// never complete the set for the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixieArtifacts {
    pub pke: String,
    pub pkr: String,
    pub e_nonce: String,
    pub authkey: String,
    pub e_hash1: String,
    pub e_hash2: String,
}

impl PixieArtifacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set(&mut self, kind: ArtifactKind, hex: impl Into<String>) {
        *self.slot_mut(kind) = hex.into();
    }

    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::PeerPublicKey => &self.pke,
            ArtifactKind::OwnPublicKey => &self.pkr,
            ArtifactKind::EnrolleeNonce => &self.e_nonce,
            ArtifactKind::AuthKey => &self.authkey,
            ArtifactKind::EHash1 => &self.e_hash1,
            ArtifactKind::EHash2 => &self.e_hash2,
        }
    }

    fn slot_mut(&mut self, kind: ArtifactKind) -> &mut String {
        match kind {
            ArtifactKind::PeerPublicKey => &mut self.pke,
            ArtifactKind::OwnPublicKey => &mut self.pkr,
            ArtifactKind::EnrolleeNonce => &mut self.e_nonce,
            ArtifactKind::AuthKey => &mut self.authkey,
            ArtifactKind::EHash1 => &mut self.e_hash1,
            ArtifactKind::EHash2 => &mut self.e_hash2,
        }
    }

    /// True once all six values are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        ArtifactKind::ALL.iter().all(|kind| !self.get(*kind).is_empty())
    }

    /// Kinds still missing, in recovery-argument order.
    #[must_use]
    pub fn missing(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.get(*kind).is_empty())
            .collect()
    }

    /// Recovery command view, available only when the set is complete.
    #[must_use]
    pub fn pixie_command(&self, force: bool) -> Option<PixieCommand> {
        if !self.is_complete() {
            return None;
        }
        Some(PixieCommand {
            params: ArtifactKind::ALL
                .iter()
                .map(|kind| (*kind, self.get(*kind).to_string()))
                .collect(),
            force,
        })
    }
}

/// Read-only parameter list for the offline recovery utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixieCommand {
    params: Vec<(ArtifactKind, String)>,
    force: bool,
}

impl PixieCommand {
    #[must_use]
    pub fn params(&self) -> &[(ArtifactKind, String)] {
        &self.params
    }

    /// Whether the exhaustive search was requested.
    #[must_use]
    pub fn force(&self) -> bool {
        self.force
    }

    /// Command-line arguments, flags interleaved with values.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.params.len() * 2 + 1);
        for (kind, value) in &self.params {
            args.push(kind.flag().to_string());
            args.push(value.clone());
        }
        if self.force {
            args.push("--force".to_string());
        }
        args
    }
}
