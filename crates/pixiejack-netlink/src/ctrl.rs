//! wpa_supplicant control socket client.
//!
//! Commands go out as single datagrams to the supplicant's per-interface
//! socket; the synchronous reply comes back on a locally bound datagram
//! socket. Only the owner of a [`CtrlSocket`] may write to it.

use std::fs;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use pixiejack_wps::MacAddress;
use rand::{distributions::Alphanumeric, Rng};

use crate::error::{NetlinkError, Result};

const REPLY_BUF_LEN: usize = 4096;
const MAX_REPLY_READS: usize = 5;

/// Synchronous command channel to the supplicant.
///
/// The session driver only needs these two primitives; tests substitute a
/// scripted implementation.
pub trait ControlChannel {
    /// Send a command and wait for its single-line reply.
    fn request(&mut self, command: &str) -> Result<String>;

    /// Send a command without waiting for a reply.
    fn send_only(&mut self, command: &str) -> Result<()>;

    /// Start PIN registration against `bssid`.
    ///
    /// # Errors
    /// Returns [`NetlinkError::CommandRejected`] when the supplicant does not
    /// answer `OK`.
    fn wps_reg(&mut self, bssid: &MacAddress, pin: &str) -> Result<()> {
        let command = format!("WPS_REG {} {}", bssid, pin);
        let reply = self.request(&command)?;
        if !reply.contains("OK") {
            return Err(NetlinkError::CommandRejected {
                command,
                reply: reply.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Abort any WPS operation in progress. Safe to call repeatedly.
    fn wps_cancel(&mut self) -> Result<()> {
        self.send_only("WPS_CANCEL")
    }
}

struct LocalSocketCleanup {
    path: PathBuf,
}

impl Drop for LocalSocketCleanup {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn build_local_socket_path(interface: &str) -> PathBuf {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let iface: String = interface.chars().take(16).collect();
    let filename = format!("pixiejack_wpa_{}_{}", iface, suffix);
    std::env::temp_dir().join(filename)
}

/// Datagram client bound to a private reply socket.
pub struct CtrlSocket {
    control_path: PathBuf,
    socket: UnixDatagram,
    _cleanup: LocalSocketCleanup,
}

impl CtrlSocket {
    /// Bind a reply socket and connect it to `control_path`.
    ///
    /// # Errors
    /// Returns [`NetlinkError::ControlSocket`] if binding, connecting or
    /// configuring timeouts fails.
    pub fn connect(interface: &str, control_path: &Path, timeout: Duration) -> Result<Self> {
        let local_path = build_local_socket_path(interface);
        if local_path.exists() {
            let _ = fs::remove_file(&local_path);
        }

        let socket = UnixDatagram::bind(&local_path).map_err(|e| NetlinkError::ControlSocket {
            path: local_path.clone(),
            reason: format!("bind failed: {}", e),
        })?;
        let cleanup = LocalSocketCleanup {
            path: local_path.clone(),
        };

        let socket_err = |reason: String| NetlinkError::ControlSocket {
            path: control_path.to_path_buf(),
            reason,
        };

        socket
            .connect(control_path)
            .map_err(|e| socket_err(format!("connect failed: {}", e)))?;
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| socket_err(format!("failed to set read timeout: {}", e)))?;
        socket
            .set_write_timeout(Some(timeout))
            .map_err(|e| socket_err(format!("failed to set write timeout: {}", e)))?;

        info!(
            "Control socket {} connected (reply socket {})",
            control_path.display(),
            local_path.display()
        );

        Ok(Self {
            control_path: control_path.to_path_buf(),
            socket,
            _cleanup: cleanup,
        })
    }

    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    fn send_raw(&self, command: &str) -> Result<()> {
        let sent = self
            .socket
            .send(command.as_bytes())
            .map_err(|e| NetlinkError::ControlSocket {
                path: self.control_path.clone(),
                reason: format!("send '{}' failed: {}", command, e),
            })?;
        if sent != command.len() {
            return Err(NetlinkError::ControlSocket {
                path: self.control_path.clone(),
                reason: format!("short write (sent {} of {} bytes)", sent, command.len()),
            });
        }
        Ok(())
    }
}

impl ControlChannel for CtrlSocket {
    fn request(&mut self, command: &str) -> Result<String> {
        debug!("ctrl -> {}", command);
        self.send_raw(command)?;

        let mut buf = vec![0u8; REPLY_BUF_LEN];
        for _ in 0..MAX_REPLY_READS {
            let n = self
                .socket
                .recv(&mut buf)
                .map_err(|e| NetlinkError::ControlSocket {
                    path: self.control_path.clone(),
                    reason: format!("no reply to '{}': {}", command, e),
                })?;
            if n == 0 {
                continue;
            }

            let reply = String::from_utf8_lossy(&buf[..n]).trim().to_string();
            if reply.starts_with('<') {
                // Unsolicited event message, not our reply.
                continue;
            }
            debug!("ctrl <- {}", reply);
            return Ok(reply);
        }

        Err(NetlinkError::ControlSocket {
            path: self.control_path.clone(),
            reason: format!("no valid reply to '{}'", command),
        })
    }

    fn send_only(&mut self, command: &str) -> Result<()> {
        debug!("ctrl -> {} (no reply)", command);
        self.send_raw(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        reply: String,
        sent: Vec<String>,
    }

    impl ControlChannel for Scripted {
        fn request(&mut self, command: &str) -> Result<String> {
            self.sent.push(command.to_string());
            Ok(self.reply.clone())
        }

        fn send_only(&mut self, command: &str) -> Result<()> {
            self.sent.push(command.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_wps_reg_formats_command() {
        let mut ctrl = Scripted {
            reply: "OK".to_string(),
            sent: Vec::new(),
        };
        let bssid: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        ctrl.wps_reg(&bssid, "12345670").unwrap();
        ctrl.wps_cancel().unwrap();
        assert_eq!(ctrl.sent, vec!["WPS_REG 00:11:22:33:44:55 12345670", "WPS_CANCEL"]);
    }

    #[test]
    fn test_wps_reg_rejection() {
        let mut ctrl = Scripted {
            reply: "FAIL\n".to_string(),
            sent: Vec::new(),
        };
        let bssid: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        match ctrl.wps_reg(&bssid, "12345670") {
            Err(NetlinkError::CommandRejected { reply, .. }) => assert_eq!(reply, "FAIL"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_request_over_real_datagram_socket() {
        let dir = tempfile::tempdir().unwrap();
        let server_path = dir.path().join("wlan0");
        let server = UnixDatagram::bind(&server_path).unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 256];
            let (n, peer) = server.recv_from(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"PING");
            let peer = peer.as_pathname().unwrap().to_path_buf();
            server.send_to(b"<3>CTRL-EVENT-SCAN-STARTED", &peer).unwrap();
            server.send_to(b"PONG\n", &peer).unwrap();
        });

        let mut ctrl = CtrlSocket::connect("wlan0", &server_path, Duration::from_secs(2)).unwrap();
        assert_eq!(ctrl.request("PING").unwrap(), "PONG");
        handle.join().unwrap();
    }
}
