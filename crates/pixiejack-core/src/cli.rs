use std::path::PathBuf;

use clap::Parser;
use pixiejack_wps::MacAddress;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pixiejack",
    author,
    version,
    about = "WPS PIN and Pixie Dust attacks driven through wpa_supplicant"
)]
pub struct Cli {
    /// Wireless interface to attack from
    #[arg(short = 'i', long = "interface")]
    pub interface: String,

    /// Target BSSID; scans and prompts when omitted
    #[arg(short = 'b', long = "bssid")]
    pub bssid: Option<MacAddress>,

    /// PIN to try; defaults to the BSSID-derived guess
    #[arg(short = 'p', long = "pin")]
    pub pin: Option<String>,

    /// Capture handshake data and recover the PIN offline with pixiewps
    #[arg(short = 'K', long = "pixie-dust")]
    pub pixie_dust: bool,

    /// Run pixiewps with --force (full range bruteforce)
    #[arg(short = 'F', long = "pixie-force")]
    pub pixie_force: bool,

    /// Do not append recovered credentials to the store
    #[arg(long = "no-save")]
    pub no_save: bool,

    /// Override the working root for logs, config and credentials
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Debug-level logging on the terminal and in the log files
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_full_flag_set() {
        let cli = Cli::try_parse_from([
            "pixiejack", "-i", "wlan0", "-b", "aa-bb-cc-dd-ee-ff", "-p", "12345670", "-K", "-F",
            "--no-save", "--root", "/tmp/pj",
        ])
        .unwrap();
        assert_eq!(cli.interface, "wlan0");
        assert_eq!(cli.bssid.unwrap().to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(cli.pin.as_deref(), Some("12345670"));
        assert!(cli.pixie_dust && cli.pixie_force && cli.no_save);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/pj")));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_interface_required() {
        assert!(Cli::try_parse_from(["pixiejack", "-K"]).is_err());
    }

    #[test]
    fn test_bad_bssid_rejected() {
        assert!(Cli::try_parse_from(["pixiejack", "-i", "wlan0", "-b", "nope"]).is_err());
    }
}
