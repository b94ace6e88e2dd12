//! Privilege and interface helpers.

use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::error::{NetlinkError, Result};

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// # Errors
/// [`NetlinkError::PermissionDenied`] when not running as root.
pub fn require_root(action: &str) -> Result<()> {
    if is_root() {
        Ok(())
    } else {
        Err(NetlinkError::PermissionDenied(format!("{} requires root", action)))
    }
}

fn validate_interface(interface: &str) -> Result<()> {
    if interface.is_empty() || interface.len() > 15 {
        return Err(NetlinkError::InvalidInput(format!(
            "invalid interface name '{}'",
            interface
        )));
    }
    if interface.contains('/') || interface.chars().any(char::is_whitespace) {
        return Err(NetlinkError::InvalidInput(format!(
            "invalid interface name '{}'",
            interface
        )));
    }
    Ok(())
}

/// `ip link set <iface> up`.
///
/// # Errors
/// [`NetlinkError::InterfaceUp`] when `ip` is missing or fails.
pub fn interface_up(interface: &str) -> Result<()> {
    validate_interface(interface)?;
    debug!("Bringing {} up", interface);
    let status = Command::new("ip")
        .args(["link", "set", interface, "up"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| NetlinkError::InterfaceUp {
            interface: interface.to_string(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        warn!("ip link set {} up exited with {}", interface, status);
        return Err(NetlinkError::InterfaceUp {
            interface: interface.to_string(),
            reason: format!("ip exited with {}", status),
        });
    }
    Ok(())
}
