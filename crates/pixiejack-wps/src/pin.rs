//! Deterministic WPS PIN generation.
//!
//! A WPS PIN is seven data digits followed by a checksum digit. Several
//! vendors derive the default PIN from the BSSID, so a handful of
//! algorithms cover a large share of deployed access points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WpsError};
use crate::mac::MacAddress;

/// PIN returned when an unknown algorithm name is requested.
pub const FALLBACK_PIN: &str = "12345670";

const PIN_MODULUS: u64 = 10_000_000;

/// Known BSSID-derived PIN algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinAlgorithm {
    /// Low 24 bits of the BSSID
    Bits24,
    /// Low 28 bits of the BSSID
    Bits28,
    /// Low 32 bits of the BSSID
    Bits32,
    /// D-Link style NIC scrambling
    VendorA,
    /// ASUS style per-byte modular digits
    VendorB,
    /// Airocon style pairwise byte sums
    VendorC,
}

impl PinAlgorithm {
    pub const ALL: [PinAlgorithm; 6] = [
        PinAlgorithm::Bits24,
        PinAlgorithm::Bits28,
        PinAlgorithm::Bits32,
        PinAlgorithm::VendorA,
        PinAlgorithm::VendorB,
        PinAlgorithm::VendorC,
    ];

    /// Short name as accepted on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PinAlgorithm::Bits24 => "pin24",
            PinAlgorithm::Bits28 => "pin28",
            PinAlgorithm::Bits32 => "pin32",
            PinAlgorithm::VendorA => "pinDLink",
            PinAlgorithm::VendorB => "pinASUS",
            PinAlgorithm::VendorC => "pinAirocon",
        }
    }

    /// Seven-digit candidate before the checksum is appended.
    #[must_use]
    pub fn candidate(&self, mac: &MacAddress) -> u64 {
        let raw = match self {
            PinAlgorithm::Bits24 => mac.to_u64() & 0xFF_FFFF,
            PinAlgorithm::Bits28 => mac.to_u64() & 0xFFF_FFFF,
            PinAlgorithm::Bits32 => mac.to_u64() & 0xFFFF_FFFF,
            PinAlgorithm::VendorA => pin_dlink(mac),
            PinAlgorithm::VendorB => pin_asus(mac),
            PinAlgorithm::VendorC => pin_airocon(mac),
        };
        raw % PIN_MODULUS
    }
}

impl fmt::Display for PinAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PinAlgorithm {
    type Err = WpsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pin24" | "bits24" => Ok(PinAlgorithm::Bits24),
            "pin28" | "bits28" => Ok(PinAlgorithm::Bits28),
            "pin32" | "bits32" => Ok(PinAlgorithm::Bits32),
            "pindlink" | "dlink" | "vendora" => Ok(PinAlgorithm::VendorA),
            "pinasus" | "asus" | "vendorb" => Ok(PinAlgorithm::VendorB),
            "pinairocon" | "airocon" | "vendorc" => Ok(PinAlgorithm::VendorC),
            other => Err(WpsError::InvalidPin(format!(
                "unknown PIN algorithm '{}'",
                other
            ))),
        }
    }
}

fn pin_dlink(mac: &MacAddress) -> u64 {
    let mut pin = (mac.to_u64() & 0xFF_FFFF) ^ 0x55_AA55;
    let nibble = pin & 0xF;
    pin ^= (nibble << 4) + (nibble << 8) + (nibble << 12) + (nibble << 16) + (nibble << 20);
    pin %= PIN_MODULUS;
    if pin < 1_000_000 {
        pin += (pin % 9) * 1_000_000 + 1_000_000;
    }
    pin
}

fn pin_asus(mac: &MacAddress) -> u64 {
    let b: Vec<u64> = mac.as_bytes().iter().map(|&x| u64::from(x)).collect();
    let tail_sum = b[1] + b[2] + b[3] + b[4] + b[5];
    (0..7u64).fold(0, |pin, i| {
        let divisor = 10 - (i + tail_sum) % 7;
        let digit = (b[(i % 6) as usize] + b[5]) % divisor;
        pin * 10 + digit
    })
}

fn pin_airocon(mac: &MacAddress) -> u64 {
    let b: Vec<u64> = mac.as_bytes().iter().map(|&x| u64::from(x)).collect();
    (b[0] + b[1]) % 10
        + ((b[5] + b[0]) % 10) * 10
        + ((b[4] + b[5]) % 10) * 100
        + ((b[3] + b[4]) % 10) * 1_000
        + ((b[2] + b[3]) % 10) * 10_000
        + ((b[1] + b[2]) % 10) * 100_000
        + ((b[0] + b[1]) % 10) * 1_000_000
}

/// WPS checksum digit for a seven-digit PIN body.
///
/// Digits are weighted 3,1,3,1,... starting from the least significant one.
#[must_use]
pub fn checksum(pin: u64) -> u8 {
    let mut pin = pin;
    let mut accum = 0u64;
    while pin > 0 {
        accum += 3 * (pin % 10);
        pin /= 10;
        accum += pin % 10;
        pin /= 10;
    }
    ((10 - accum % 10) % 10) as u8
}

/// Full eight-digit PIN for `mac` using `algorithm`.
#[must_use]
pub fn generate(algorithm: PinAlgorithm, mac: &MacAddress) -> String {
    let body = algorithm.candidate(mac);
    format!("{:07}{}", body, checksum(body))
}

/// Name-based lookup; unknown names yield [`FALLBACK_PIN`].
#[must_use]
pub fn generate_by_name(name: &str, mac: &MacAddress) -> String {
    match name.parse::<PinAlgorithm>() {
        Ok(algorithm) => generate(algorithm, mac),
        Err(_) => FALLBACK_PIN.to_string(),
    }
}

/// Default first guess for a target.
#[must_use]
pub fn default_guess(mac: &MacAddress) -> String {
    generate(PinAlgorithm::Bits24, mac)
}

/// Check that `pin` is eight digits with a valid trailing checksum.
///
/// # Errors
///
/// Returns [`WpsError::InvalidPin`] describing the first problem found.
pub fn validate(pin: &str) -> Result<()> {
    if pin.len() != 8 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(WpsError::InvalidPin(format!(
            "'{}' is not an 8 digit PIN",
            pin
        )));
    }
    let body: u64 = pin[..7]
        .parse()
        .map_err(|_| WpsError::InvalidPin(pin.to_string()))?;
    let expected = checksum(body);
    let actual = pin.as_bytes()[7] - b'0';
    if expected != actual {
        return Err(WpsError::InvalidPin(format!(
            "checksum digit of '{}' should be {}",
            pin, expected
        )));
    }
    Ok(())
}
