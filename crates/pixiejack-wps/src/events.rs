//! Classification of supplicant debug output.
//!
//! wpa_supplicant run with `-d -K` prints one event per line on stdout.
//! The handful of markers the session cares about are matched here and
//! nowhere else, so the vocabulary can be tested without a live process.

use crate::artifacts::ArtifactKind;

/// Name reported when the network name cannot be decoded.
pub const UNKNOWN_SSID: &str = "<unknown name>";

const HEXDUMP_MARKER: &str = "hexdump";

/// Substring tags of the six artifact hexdumps.
const ARTIFACT_TAGS: [(&str, ArtifactKind); 6] = [
    ("Enrollee Nonce", ArtifactKind::EnrolleeNonce),
    ("DH own Public Key", ArtifactKind::OwnPublicKey),
    ("DH peer Public Key", ArtifactKind::PeerPublicKey),
    ("AuthKey", ArtifactKind::AuthKey),
    ("E-Hash1", ArtifactKind::EHash1),
    ("E-Hash2", ArtifactKind::EHash2),
];

/// What a single supplicant output line means to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `Building Message M<n>`
    Sending(u8),
    /// `Received M<n>`
    Received(u8),
    /// `Received WSC_NACK`
    Nack,
    /// Hexdump of one Pixie Dust input
    Artifact { kind: ArtifactKind, hex: String },
    /// Hexdump of the network key, already decoded
    NetworkKey { psk: String },
    /// `WPS-FAIL`
    Failure,
    Associating,
    Associated,
    /// Authentication started; carries the decoded network name
    Authenticating { ssid: String },
    Unrecognized,
}

/// Classify one line of supplicant output.
#[must_use]
pub fn classify_event(line: &str) -> EventKind {
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(n) = message_number(line, "Building Message M") {
        return EventKind::Sending(n);
    }
    if let Some(n) = message_number(line, "Received M") {
        return EventKind::Received(n);
    }
    if line.contains("Received WSC_NACK") {
        return EventKind::Nack;
    }

    if line.contains(HEXDUMP_MARKER) {
        for (tag, kind) in ARTIFACT_TAGS {
            if line.contains(tag) {
                return match extract_hex(line) {
                    Some(hex) => EventKind::Artifact { kind, hex },
                    None => EventKind::Unrecognized,
                };
            }
        }
        if line.contains("Network Key") {
            return match extract_hex(line).and_then(|hex| decode_hex(&hex)) {
                Some(bytes) => EventKind::NetworkKey {
                    psk: String::from_utf8_lossy(&bytes).into_owned(),
                },
                None => EventKind::Unrecognized,
            };
        }
    }

    if line.contains("WPS-FAIL") {
        return EventKind::Failure;
    }
    if line.contains("Trying to associate") {
        return EventKind::Associating;
    }
    if line.contains("Associated with") {
        return EventKind::Associated;
    }
    if line.contains("SSID") && line.contains("Trying to authenticate") {
        return EventKind::Authenticating {
            ssid: decode_ssid(line),
        };
    }

    EventKind::Unrecognized
}

fn message_number(line: &str, marker: &str) -> Option<u8> {
    let (_, rest) = line.split_once(marker)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Hex payload of a `hexdump(len=N): aa bb ..` line, spaces removed and
/// uppercased. Works with and without a leading timestamp field.
#[must_use]
pub fn extract_hex(line: &str) -> Option<String> {
    let start = line.find(HEXDUMP_MARKER)?;
    let (_, payload) = line[start..].split_once(':')?;
    let hex: String = payload
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(hex)
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

/// Network name from an authentication progress line.
///
/// The name is the text between the first and the last single quote, with
/// the supplicant's printf escapes undone. Anything that does not decode to
/// UTF-8 yields [`UNKNOWN_SSID`].
#[must_use]
pub fn decode_ssid(line: &str) -> String {
    let (Some(first), Some(last)) = (line.find('\''), line.rfind('\'')) else {
        return UNKNOWN_SSID.to_string();
    };
    if last <= first {
        return UNKNOWN_SSID.to_string();
    }
    unescape(&line[first + 1..last])
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| UNKNOWN_SSID.to_string())
}

fn unescape(quoted: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(quoted.len());
    let mut bytes = quoted.bytes();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next()? {
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'\'' => out.push(b'\''),
            b'e' => out.push(0x1b),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'x' => {
                let hi = bytes.next()?;
                let lo = bytes.next()?;
                let pair = [hi, lo];
                let text = std::str::from_utf8(&pair).ok()?;
                out.push(u8::from_str_radix(text, 16).ok()?);
            }
            _ => return None,
        }
    }
    Some(out)
}
