//! Interactive target selection from a scan.

use std::io::BufRead;

use pixiejack_netlink::{NetlinkError, ScanEntry};
use pixiejack_wps::MacAddress;

use crate::report::Reporter;

const PROMPT: &str = "Select Target ID (r=refresh): ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Refresh,
    Index(usize),
    Invalid,
}

/// Interpret one line of operator input against a table of `count` rows.
pub fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.trim();
    if input.eq_ignore_ascii_case("r") {
        return Selection::Refresh;
    }
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Selection::Invalid;
    }
    match input.parse::<usize>() {
        Ok(idx) if idx < count => Selection::Index(idx),
        _ => Selection::Invalid,
    }
}

/// Table rows for `entries`: `ID BSSID PWR LCK SSID`.
pub fn render_table(entries: &[ScanEntry]) -> Vec<String> {
    let mut rows = Vec::with_capacity(entries.len() + 2);
    rows.push(format!("{:<4} {:<18} {:<5} {:<4} {}", "ID", "BSSID", "PWR", "LCK", "SSID"));
    rows.push("──── ────────────────── ───── ──── ────────────────".to_string());
    for (idx, entry) in entries.iter().enumerate() {
        let locked = if entry.locked { "YES" } else { "NO" };
        rows.push(format!(
            "{:<4} {:<18} {:<5} {:<4} {}",
            idx,
            entry.bssid.to_string(),
            entry.signal as i64,
            locked,
            entry.ssid
        ));
    }
    rows
}

/// Scan, show the ranked table and read a choice from `input`.
///
/// Invalid input re-prompts, `r` scans again. Returns `Ok(None)` when the
/// input ends (operator cancelled).
///
/// # Errors
/// [`NetlinkError::ScanUnavailable`] when a scan finds no WPS networks, or
/// I/O errors reading `input`.
pub fn select_target<S, I>(
    interface: &str,
    mut scan: S,
    input: &mut I,
    reporter: &mut Reporter,
) -> Result<Option<MacAddress>, NetlinkError>
where
    S: FnMut() -> Vec<ScanEntry>,
    I: BufRead,
{
    'scan: loop {
        reporter.info(format!("Scanning on {}...", interface));
        let entries = scan();
        if entries.is_empty() {
            reporter.error("No WPS Networks found.");
            return Err(NetlinkError::ScanUnavailable {
                interface: interface.to_string(),
                reason: "no WPS-capable access points found".to_string(),
            });
        }

        reporter.line("");
        for row in render_table(&entries) {
            reporter.line(row);
        }
        reporter.line("");

        loop {
            reporter.prompt(PROMPT);
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match parse_selection(&line, entries.len()) {
                Selection::Refresh => continue 'scan,
                Selection::Index(idx) => {
                    let entry = &entries[idx];
                    tracing::info!("Selected {} ({})", entry.bssid, entry.ssid);
                    return Ok(Some(entry.bssid));
                }
                Selection::Invalid => reporter.error("Invalid selection."),
            }
        }
    }
}
