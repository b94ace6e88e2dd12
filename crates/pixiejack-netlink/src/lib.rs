//! OS plumbing around the external tools pixiejack drives.
//!
//! - [`ctrl`]: datagram control socket to wpa_supplicant
//! - [`supplicant`]: supplicant process lifecycle and its event stream
//! - [`scan`]: `iw` scan invocation and parsing
//! - [`pixie`]: `pixiewps` invocation
//! - [`system`]: privilege check and interface bring-up
//!
//! The session driver talks to these through the [`ControlChannel`],
//! [`EventSource`] and [`PinRecovery`] traits so it can be exercised without
//! a wireless card.

pub mod ctrl;
pub mod error;
pub mod pixie;
pub mod scan;
pub mod supplicant;
pub mod system;

pub use ctrl::{ControlChannel, CtrlSocket};
pub use error::{NetlinkError, Result};
pub use pixie::{parse_pixie_output, PinRecovery, PixieRunner, RecoveredPin, DEFAULT_PIXIEWPS};
pub use scan::{parse_scan_output, scan, ScanEntry, DEFAULT_IW, HIDDEN_SSID, UNKNOWN_SIGNAL};
pub use supplicant::{
    EventSource, LineReceiver, SupplicantConfig, SupplicantHandle, SupplicantProcess,
    DEFAULT_SUPPLICANT,
};
pub use system::{interface_up, is_root, require_root};
