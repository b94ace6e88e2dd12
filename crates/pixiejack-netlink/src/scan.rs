//! WPS-capable access point discovery via `iw dev <iface> scan`.

use std::process::{Command, Stdio};

use log::{debug, info, warn};
use pixiejack_wps::MacAddress;

pub const DEFAULT_IW: &str = "iw";

/// Name shown for access points that do not broadcast one.
pub const HIDDEN_SSID: &str = "<Hidden>";

/// Signal reported when the scan output carries no parseable value.
pub const UNKNOWN_SIGNAL: f64 = -100.0;

/// One access point from a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry {
    pub bssid: MacAddress,
    pub ssid: String,
    /// dBm, more negative is weaker
    pub signal: f64,
    pub wps: bool,
    pub locked: bool,
}

impl ScanEntry {
    fn new(bssid: MacAddress) -> Self {
        Self {
            bssid,
            ssid: HIDDEN_SSID.to_string(),
            signal: UNKNOWN_SIGNAL,
            wps: false,
            locked: false,
        }
    }
}

/// Parse `iw` scan output into WPS-capable entries, strongest first.
///
/// Entries with equal signal keep their scan order. A BSS that appears twice
/// keeps its first position and takes the later attributes.
pub fn parse_scan_output(text: &str) -> Vec<ScanEntry> {
    let mut entries: Vec<ScanEntry> = Vec::new();
    let mut current: Option<usize> = None;

    for raw in text.lines() {
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix("BSS ") {
            let addr = rest.split('(').next().unwrap_or_default().trim();
            current = match addr.parse::<MacAddress>() {
                Ok(bssid) => {
                    let entry = ScanEntry::new(bssid);
                    match entries.iter().position(|e| e.bssid == bssid) {
                        Some(idx) => {
                            entries[idx] = entry;
                            Some(idx)
                        }
                        None => {
                            entries.push(entry);
                            Some(entries.len() - 1)
                        }
                    }
                }
                Err(e) => {
                    debug!("Skipping scan record '{}': {}", addr, e);
                    None
                }
            };
            continue;
        }

        let Some(idx) = current else { continue };
        let entry = &mut entries[idx];

        if let Some(ssid) = line.strip_prefix("SSID:") {
            let ssid = ssid.trim();
            if !ssid.is_empty() {
                entry.ssid = ssid.to_string();
            }
        } else if let Some(signal) = line.strip_prefix("signal:") {
            if let Some(value) = signal.split_whitespace().next().and_then(|v| v.parse().ok()) {
                entry.signal = value;
            }
        } else if line.contains("WPS:") {
            entry.wps = true;
        } else if line.contains("AP setup locked") {
            entry.locked = true;
        }
    }

    entries.retain(|e| e.wps);
    // sort_by is stable
    entries.sort_by(|a, b| b.signal.total_cmp(&a.signal));
    entries
}

/// Run a scan on `interface`.
///
/// Launch failures are logged and yield an empty list; deciding whether an
/// empty catalog is fatal is up to the caller.
pub fn scan(iw: &str, interface: &str) -> Vec<ScanEntry> {
    info!("Scanning on {}", interface);
    let output = Command::new(iw)
        .args(["dev", interface, "scan"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to run {} scan on {}: {}", iw, interface, e);
            return Vec::new();
        }
    };
    if !output.status.success() {
        warn!("{} scan on {} exited with {}", iw, interface, output.status);
    }

    let entries = parse_scan_output(&String::from_utf8_lossy(&output.stdout));
    info!("Scan found {} WPS networks", entries.len());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
BSS 00:11:22:33:44:55(on wlan0)
\tfreq: 2412
\tsignal: -71.00 dBm
\tSSID: Weak
\tWPS:\t * Version: 1.0
\t\t * Wi-Fi Protected Setup State: 2 (Configured)
BSS aa:bb:cc:dd:ee:ff(on wlan0) -- associated
\tsignal: -40.00 dBm
\tSSID: NoWps
BSS 66:77:88:99:aa:bb(on wlan0)
\tsignal: -40.00 dBm
\tSSID:
\tWPS:\t * Version: 1.0
\t\t * AP setup locked: 0x01
BSS 10:20:30:40:50:60(on wlan0)
\tsignal: garbage
\tSSID: Strong
\tWPS:\t * Version: 1.0
BSS 01:02:03:04:05:06(on wlan0)
\tsignal: -40.00 dBm
\tSSID: Tie
\tWPS:\t * Version: 1.0
";

    #[test]
    fn test_only_wps_entries_kept() {
        let entries = parse_scan_output(SAMPLE);
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.wps));
        assert!(entries.iter().all(|e| e.ssid != "NoWps"));
    }

    #[test]
    fn test_ordering_is_stable_descending() {
        let entries = parse_scan_output(SAMPLE);
        let names: Vec<&str> = entries.iter().map(|e| e.ssid.as_str()).collect();
        assert_eq!(names, vec![HIDDEN_SSID, "Tie", "Weak", "Strong"]);
        for pair in entries.windows(2) {
            assert!(pair[0].signal >= pair[1].signal);
        }
    }

    #[test]
    fn test_hidden_name_and_lock() {
        let entries = parse_scan_output(SAMPLE);
        let hidden = &entries[0];
        assert_eq!(hidden.bssid.to_string(), "66:77:88:99:AA:BB");
        assert_eq!(hidden.ssid, HIDDEN_SSID);
        assert!(hidden.locked);
        assert!(!entries[1].locked);
    }

    #[test]
    fn test_unparseable_signal_defaults() {
        let entries = parse_scan_output(SAMPLE);
        let strong = entries.iter().find(|e| e.ssid == "Strong").unwrap();
        assert_eq!(strong.signal, UNKNOWN_SIGNAL);
    }

    #[test]
    fn test_duplicate_bss_keeps_position() {
        let text = "\
BSS 00:00:00:00:00:01(on wlan0)
\tsignal: -50.00 dBm
\tWPS:\t * Version: 1.0
BSS 00:00:00:00:00:02(on wlan0)
\tsignal: -50.00 dBm
\tWPS:\t * Version: 1.0
BSS 00:00:00:00:00:01(on wlan0)
\tsignal: -50.00 dBm
\tSSID: again
\tWPS:\t * Version: 1.0
";
        let entries = parse_scan_output(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ssid, "again");
        assert_eq!(entries[0].bssid.to_string(), "00:00:00:00:00:01");
    }

    #[test]
    fn test_attributes_before_first_bss_ignored() {
        let entries = parse_scan_output("\tWPS: stray\nnot a record\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_missing_scanner_yields_empty_catalog() {
        assert!(scan("/nonexistent/pixiejack-iw", "wlan0").is_empty());
    }
}
