//! WPS PIN-space logic and supplicant handshake bookkeeping.
//!
//! Everything in this crate is pure: no sockets, no processes. The netlink
//! crate feeds it supplicant output and the core crate drives the session.

pub mod artifacts;
pub mod error;
pub mod events;
pub mod mac;
pub mod outcome;
pub mod pin;

pub use artifacts::{ArtifactKind, PixieArtifacts, PixieCommand};
pub use error::{Result, WpsError};
pub use events::{classify_event, decode_ssid, extract_hex, EventKind, UNKNOWN_SSID};
pub use mac::MacAddress;
pub use outcome::{SessionOutcome, SessionStatus};
pub use pin::{
    checksum, default_guess, generate, generate_by_name, validate as validate_pin, PinAlgorithm,
    FALLBACK_PIN,
};
