//! Hardware address handling.
//!
//! WPS PIN algorithms operate on the BSSID as a 48-bit integer, while the
//! supplicant and the operator use the colon-separated text form. A
//! [`MacAddress`] always holds both views consistently.
//!
//! ## Example
//!
//! ```
//! use pixiejack_wps::MacAddress;
//!
//! let mac: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
//! assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:FF");
//! assert_eq!(mac.to_u64(), 0xAABB_CCDD_EEFF);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WpsError};

/// Largest value representable in 48 bits.
pub const MAX_MAC_VALUE: u64 = 0xFFFF_FFFF_FFFF;

/// A validated 48-bit hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress {
    bytes: [u8; 6],
}

impl MacAddress {
    /// Create a MAC address from raw bytes
    #[must_use]
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Build an address from its integer form.
    ///
    /// # Errors
    ///
    /// Returns [`WpsError::InvalidAddress`] if `value` does not fit in 48 bits.
    pub fn from_u64(value: u64) -> Result<Self> {
        if value > MAX_MAC_VALUE {
            return Err(WpsError::InvalidAddress(format!(
                "{:#x} exceeds 48 bits",
                value
            )));
        }
        let wide = value.to_be_bytes();
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&wide[2..]);
        Ok(Self { bytes })
    }

    /// Parse a MAC address from string
    ///
    /// Accepts `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF`, `AABB.CCDD.EEFF`
    /// and `AABBCCDDEEFF`, in any letter case.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid MAC address
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Integer form of the address.
    #[must_use]
    pub fn to_u64(&self) -> u64 {
        self.bytes
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[0],
            self.bytes[1],
            self.bytes[2],
            self.bytes[3],
            self.bytes[4],
            self.bytes[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = WpsError;

    fn from_str(s: &str) -> Result<Self> {
        let digits: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect();

        if digits.len() != 12 {
            return Err(WpsError::InvalidAddress(format!(
                "Expected 12 hex digits, got {} in '{}'",
                digits.len(),
                s
            )));
        }

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WpsError::InvalidAddress(format!(
                "Non-hex character in '{}'",
                s
            )));
        }

        let value = u64::from_str_radix(&digits, 16)
            .map_err(|e| WpsError::InvalidAddress(format!("{}: {}", s, e)))?;
        Self::from_u64(value)
    }
}

impl TryFrom<u64> for MacAddress {
    type Error = WpsError;

    fn try_from(value: u64) -> Result<Self> {
        Self::from_u64(value)
    }
}

impl From<MacAddress> for u64 {
    fn from(mac: MacAddress) -> Self {
        mac.to_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_colon() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.bytes, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(mac.to_u64(), 0xAABB_CCDD_EEFF);
    }

    #[test]
    fn test_mac_parse_dash_and_dot() {
        let dash: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        let dot: MacAddress = "aabb.ccdd.eeff".parse().unwrap();
        assert_eq!(dash, dot);
        assert_eq!(dot.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_mac_parse_continuous() {
        let mac: MacAddress = "00112233445a".parse().unwrap();
        assert_eq!(mac.to_string(), "00:11:22:33:44:5A");
    }

    #[test]
    fn test_mac_from_small_integer_is_zero_padded() {
        let mac = MacAddress::from_u64(0x1).unwrap();
        assert_eq!(mac.to_string(), "00:00:00:00:00:01");
    }

    #[test]
    fn test_mac_integer_round_trip() {
        for value in [0u64, 1, 0xDEAD_BEEF, 0x0123_4567_89AB, MAX_MAC_VALUE] {
            let mac = MacAddress::from_u64(value).unwrap();
            let reparsed: MacAddress = mac.to_string().parse().unwrap();
            assert_eq!(reparsed.to_u64(), value);
        }
    }

    #[test]
    fn test_mac_rejects_wide_integer() {
        assert!(MacAddress::from_u64(MAX_MAC_VALUE + 1).is_err());
    }

    #[test]
    fn test_invalid_mac() {
        assert!("not a mac".parse::<MacAddress>().is_err());
        assert!("AA:BB".parse::<MacAddress>().is_err());
        assert!("AA:BB:CC:DD:EE:GG".parse::<MacAddress>().is_err());
        assert!("AA:BB:CC:DD:EE:FF:00".parse::<MacAddress>().is_err());
        assert!("+A:BB:CC:DD:EE:FF".parse::<MacAddress>().is_err());
    }
}
