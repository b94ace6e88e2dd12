//! Offline Pixie Dust PIN recovery through the `pixiewps` utility.

use std::fmt;
use std::process::{Command, Stdio};

use log::{debug, info};
use pixiejack_wps::PixieCommand;

use crate::error::{NetlinkError, Result};

pub const DEFAULT_PIXIEWPS: &str = "pixiewps";

const EMPTY_PIN_TOKEN: &str = "<empty>";

/// PIN reported by the recovery utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredPin {
    Pin(String),
    /// The AP accepts an empty PIN
    Empty,
}

impl RecoveredPin {
    /// Value to send in `WPS_REG`. An empty PIN goes out as a literal `''`.
    #[must_use]
    pub fn as_command_arg(&self) -> &str {
        match self {
            RecoveredPin::Pin(pin) => pin,
            RecoveredPin::Empty => "''",
        }
    }
}

impl fmt::Display for RecoveredPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveredPin::Pin(pin) => f.write_str(pin),
            RecoveredPin::Empty => f.write_str(EMPTY_PIN_TOKEN),
        }
    }
}

/// Find the recovered PIN in the utility's stdout.
///
/// Looks for a `[+] WPS pin: <value>` line and takes the text after the last
/// colon.
pub fn parse_pixie_output(stdout: &str) -> Option<RecoveredPin> {
    stdout
        .lines()
        .find(|line| line.contains("[+]") && line.contains("WPS pin"))
        .and_then(|line| line.rsplit(':').next())
        .map(str::trim)
        .filter(|pin| !pin.is_empty())
        .map(|pin| {
            if pin == EMPTY_PIN_TOKEN {
                RecoveredPin::Empty
            } else {
                RecoveredPin::Pin(pin.to_string())
            }
        })
}

/// Something that turns a complete artifact set into a PIN.
pub trait PinRecovery {
    /// # Errors
    /// [`NetlinkError::RecoveryUnavailable`] when the utility cannot run,
    /// fails, or finds nothing.
    fn recover(&mut self, command: &PixieCommand) -> Result<RecoveredPin>;
}

/// Runs the external `pixiewps` binary.
#[derive(Debug, Clone)]
pub struct PixieRunner {
    program: String,
}

impl PixieRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PixieRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PIXIEWPS)
    }
}

impl PinRecovery for PixieRunner {
    fn recover(&mut self, command: &PixieCommand) -> Result<RecoveredPin> {
        info!(
            "Running {} (force: {})",
            self.program,
            command.force()
        );
        let args = command.args();
        debug!("{} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| {
                NetlinkError::RecoveryUnavailable(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(NetlinkError::RecoveryUnavailable(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pixie_output(&stdout).ok_or_else(|| {
            NetlinkError::RecoveryUnavailable("PIN not found in handshake data".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixiejack_wps::{ArtifactKind, PixieArtifacts};

    const FOUND: &str = "
 Pixiewps 1.4

 [*] Mode:       1 (RT/MT/CL)
 [*] Seed N1:    0x00000000
 [+] WPS pin:    12345670

 [*] Time taken: 0 s 21 ms
";

    #[test]
    fn test_parse_found_pin() {
        assert_eq!(
            parse_pixie_output(FOUND),
            Some(RecoveredPin::Pin("12345670".to_string()))
        );
    }

    #[test]
    fn test_parse_empty_pin_sentinel() {
        let out = " [+] WPS pin:    <empty>\n";
        let pin = parse_pixie_output(out).unwrap();
        assert_eq!(pin, RecoveredPin::Empty);
        assert_eq!(pin.as_command_arg(), "''");
        assert_eq!(pin.to_string(), "<empty>");
    }

    #[test]
    fn test_parse_not_found() {
        let out = " [-] WPS pin not found!\n\n [*] Time taken: 0 s 40 ms\n";
        assert_eq!(parse_pixie_output(out), None);
        assert_eq!(parse_pixie_output(""), None);
    }

    fn full_command() -> PixieCommand {
        let mut artifacts = PixieArtifacts::new();
        for kind in ArtifactKind::ALL {
            artifacts.set(kind, "AA");
        }
        artifacts.pixie_command(false).unwrap()
    }

    #[test]
    fn test_missing_binary_is_recovery_unavailable() {
        let mut runner = PixieRunner::new("/nonexistent/pixiejack-pixiewps");
        let err = runner.recover(&full_command()).unwrap_err();
        assert!(matches!(err, NetlinkError::RecoveryUnavailable(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_failing_utility_is_recovery_unavailable() {
        let mut runner = PixieRunner::new("false");
        let err = runner.recover(&full_command()).unwrap_err();
        assert!(matches!(err, NetlinkError::RecoveryUnavailable(ref m) if m.contains("exited")));
    }

    #[test]
    fn test_silent_utility_is_recovery_unavailable() {
        let mut runner = PixieRunner::new("true");
        let err = runner.recover(&full_command()).unwrap_err();
        assert!(matches!(err, NetlinkError::RecoveryUnavailable(ref m) if m.contains("not found")));
    }
}
