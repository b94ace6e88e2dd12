//! Append-only store of recovered credentials.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use pixiejack_wps::MacAddress;

/// Network access recovered by a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub essid: String,
    pub bssid: MacAddress,
    pub pin: String,
    pub psk: String,
}

/// Human-readable block appended for every success.
pub fn format_entry<Tz: TimeZone>(creds: &Credentials, when: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = when.format("%Y-%m-%d %I:%M:%S %p");
    format!(
        "╔════ CREDENTIALS FOUND ═════════════════╗\n\
         ║ TIME  : {timestamp}\n\
         ║ SSID  : {}\n\
         ║ BSSID : {}\n\
         ║ PIN   : {}\n\
         ║ PSK   : {}\n\
         ╚════════════════════════════════════════╝\n",
        creds.essid, creds.bssid, creds.pin, creds.psk
    )
}

/// Append `creds` to the store at `path`, creating parent directories.
pub fn save_credentials(path: &Path, creds: &Credentials) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating credential dir {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    file.write_all(format_entry(creds, &Local::now()).as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Saved credentials for {} to {}", creds.bssid, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn creds() -> Credentials {
        Credentials {
            essid: "Lab Net".to_string(),
            bssid: "00:11:22:33:44:55".parse().unwrap(),
            pin: "12345670".to_string(),
            psk: "hello".to_string(),
        }
    }

    #[test]
    fn test_entry_format() {
        let when = Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap();
        let entry = format_entry(&creds(), &when);
        let lines: Vec<&str> = entry.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "║ TIME  : 2026-10-16 02:05:09 PM");
        assert_eq!(lines[2], "║ SSID  : Lab Net");
        assert_eq!(lines[3], "║ BSSID : 00:11:22:33:44:55");
        assert_eq!(lines[4], "║ PIN   : 12345670");
        assert_eq!(lines[5], "║ PSK   : hello");
    }

    #[test]
    fn test_save_appends_and_creates_dir() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("store").join("pixiejack_creds.txt");
        save_credentials(&path, &creds()).unwrap();
        save_credentials(&path, &creds()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("CREDENTIALS FOUND").count(), 2);
    }
}
