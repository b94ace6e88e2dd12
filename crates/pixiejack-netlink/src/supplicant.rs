//! wpa_supplicant process supervision.
//!
//! The supplicant runs in debug mode inside a per-run temporary directory
//! that holds its config file and control socket. Its stdout and stderr are
//! forwarded line by line to a channel so the session driver can block on
//! the next event and still flush stale output without blocking.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tempfile::TempDir;

use crate::error::{NetlinkError, Result};

pub const DEFAULT_SUPPLICANT: &str = "wpa_supplicant";
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READY_POLL: Duration = Duration::from_millis(100);

const CONF_NAME: &str = "wpa.conf";
const DRIVERS: &str = "nl80211,wext,hostapd,wired";

/// Line-oriented supplicant output.
pub trait EventSource {
    /// Block until the next line arrives. `Ok(None)` once the stream closed.
    fn next_line(&mut self) -> Result<Option<String>>;

    /// Discard everything already buffered without blocking. Returns the
    /// number of lines dropped.
    fn drain(&mut self) -> usize;
}

/// Receiving end of the reader threads.
pub struct LineReceiver {
    rx: Receiver<String>,
}

impl LineReceiver {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }
}

impl EventSource for LineReceiver {
    fn next_line(&mut self) -> Result<Option<String>> {
        // All senders gone means the supplicant closed its output.
        Ok(self.rx.recv().ok())
    }

    fn drain(&mut self) -> usize {
        let mut dropped = 0;
        loop {
            match self.rx.try_recv() {
                Ok(_) => dropped += 1,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        dropped
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(name: &str, stream: R, tx: Sender<String>) {
    let name = name.to_string();
    let spawned = thread::Builder::new()
        .name(format!("supplicant-{}", name))
        .spawn(move || {
            let reader = BufReader::new(stream);
            for chunk in reader.split(b'\n') {
                let Ok(bytes) = chunk else { break };
                let line = String::from_utf8_lossy(&bytes)
                    .trim_end_matches('\r')
                    .to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to start supplicant {} reader: {}", name, e);
    }
}

/// Launch parameters.
#[derive(Debug, Clone)]
pub struct SupplicantConfig {
    pub program: String,
    pub interface: String,
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
}

impl SupplicantConfig {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            program: DEFAULT_SUPPLICANT.to_string(),
            interface: interface.into(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            poll_interval: DEFAULT_READY_POLL,
        }
    }
}

/// Contents of the generated supplicant config.
pub fn render_config(ctrl_dir: &Path) -> String {
    format!(
        "ctrl_interface={}\nctrl_interface_group=root\nupdate_config=1\n",
        ctrl_dir.display()
    )
}

/// Command-line arguments for a debug-mode supplicant.
pub fn supplicant_args(interface: &str, conf: &Path) -> Vec<String> {
    vec![
        "-K".to_string(),
        "-d".to_string(),
        format!("-D{}", DRIVERS),
        format!("-i{}", interface),
        format!("-c{}", conf.display()),
    ]
}

/// Poll until `path` exists.
///
/// `alive` is consulted on every poll so a supplicant that dies during
/// startup is reported immediately instead of after the full timeout.
///
/// # Errors
/// [`NetlinkError::StartupTimeout`] when the path did not appear in time, or
/// whatever `alive` returns.
pub fn wait_for_path<F>(path: &Path, timeout: Duration, poll: Duration, mut alive: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let started = Instant::now();
    loop {
        if path.exists() {
            debug!("{} ready after {:?}", path.display(), started.elapsed());
            return Ok(());
        }
        alive()?;
        if started.elapsed() >= timeout {
            return Err(NetlinkError::StartupTimeout {
                path: path.to_path_buf(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        thread::sleep(poll);
    }
}

/// Process-group handle used for out-of-band cleanup (interrupt handler).
#[derive(Debug, Clone)]
pub struct SupplicantHandle {
    pgid: i32,
    session_dir: PathBuf,
}

impl SupplicantHandle {
    pub fn new(pgid: i32, session_dir: PathBuf) -> Self {
        Self { pgid, session_dir }
    }

    pub fn pgid(&self) -> i32 {
        self.pgid
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    /// Send SIGTERM to the supplicant's process group and remove the
    /// session directory. Errors are logged, never returned.
    pub fn terminate(&self) {
        signal_group(self.pgid, libc::SIGTERM);
        if self.session_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.session_dir) {
                warn!(
                    "Failed to remove session dir {}: {}",
                    self.session_dir.display(),
                    e
                );
            }
        }
    }
}

fn signal_group(pgid: i32, signal: i32) -> bool {
    if pgid <= 0 {
        return false;
    }
    // Negative pid addresses the whole process group.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc != 0 {
        debug!(
            "kill(-{}, {}) failed: {}",
            pgid,
            signal,
            std::io::Error::last_os_error()
        );
        return false;
    }
    true
}

/// A running supplicant bound to one interface.
pub struct SupplicantProcess {
    child: Child,
    dir: Option<TempDir>,
    control_path: PathBuf,
    events: Option<LineReceiver>,
    terminated: bool,
}

impl SupplicantProcess {
    /// Create the session directory, write the config and start the
    /// supplicant in its own process group. Does not wait for readiness.
    ///
    /// # Errors
    /// [`NetlinkError::Spawn`] if the binary cannot be started, I/O errors
    /// from preparing the session directory.
    pub fn spawn(config: &SupplicantConfig) -> Result<Self> {
        if config.interface.is_empty() {
            return Err(NetlinkError::InvalidInput(
                "interface name is empty".to_string(),
            ));
        }

        let dir = tempfile::Builder::new().prefix("pixiejack-").tempdir()?;
        let conf = dir.path().join(CONF_NAME);
        fs::write(&conf, render_config(dir.path()))?;
        let control_path = dir.path().join(&config.interface);

        info!(
            "Starting {} on {} (session dir {})",
            config.program,
            config.interface,
            dir.path().display()
        );

        let mut child = Command::new(&config.program)
            .args(supplicant_args(&config.interface, &conf))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|e| NetlinkError::Spawn {
                program: config.program.clone(),
                reason: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader("stdout", stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader("stderr", stderr, tx);
        }

        Ok(Self {
            child,
            dir: Some(dir),
            control_path,
            events: Some(LineReceiver::new(rx)),
            terminated: false,
        })
    }

    pub fn wait_ready(&mut self, timeout: Duration, poll: Duration) -> Result<()> {
        let path = self.control_path.clone();
        let child = &mut self.child;
        wait_for_path(&path, timeout, poll, || match child.try_wait() {
            Ok(Some(status)) => Err(NetlinkError::SupplicantExited(status.to_string())),
            Ok(None) => Ok(()),
            Err(e) => Err(NetlinkError::Io(e)),
        })
    }

    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Hand the event stream to the session driver. Returns `None` if it
    /// was already taken.
    pub fn take_events(&mut self) -> Option<LineReceiver> {
        self.events.take()
    }

    pub fn handle(&self) -> SupplicantHandle {
        SupplicantHandle {
            pgid: self.child.id() as i32,
            session_dir: self
                .dir
                .as_ref()
                .map(|d| d.path().to_path_buf())
                .unwrap_or_default(),
        }
    }

    /// Stop the supplicant and remove the session directory. Idempotent.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if let Ok(None) = self.child.try_wait() {
            signal_group(self.child.id() as i32, libc::SIGTERM);
            let deadline = Instant::now() + Duration::from_secs(2);
            loop {
                match self.child.try_wait() {
                    Ok(Some(_)) | Err(_) => break,
                    Ok(None) if Instant::now() >= deadline => {
                        warn!("Supplicant did not exit on SIGTERM, killing");
                        let _ = self.child.kill();
                        let _ = self.child.wait();
                        break;
                    }
                    Ok(None) => thread::sleep(Duration::from_millis(50)),
                }
            }
        }

        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                debug!("Session dir {} already gone: {}", path.display(), e);
            }
        }
    }
}

impl Drop for SupplicantProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_config() {
        let conf = render_config(Path::new("/tmp/pj"));
        assert_eq!(
            conf,
            "ctrl_interface=/tmp/pj\nctrl_interface_group=root\nupdate_config=1\n"
        );
    }

    #[test]
    fn test_supplicant_args() {
        let args = supplicant_args("wlan0", Path::new("/tmp/pj/wpa.conf"));
        assert_eq!(
            args,
            vec![
                "-K",
                "-d",
                "-Dnl80211,wext,hostapd,wired",
                "-iwlan0",
                "-c/tmp/pj/wpa.conf"
            ]
        );
    }

    #[test]
    fn test_wait_for_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wlan0");
        fs::write(&path, b"").unwrap();
        wait_for_path(&path, Duration::from_millis(10), Duration::from_millis(1), || Ok(())).unwrap();
    }

    #[test]
    fn test_wait_for_missing_path_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wlan0");
        let err = wait_for_path(&path, Duration::from_millis(30), Duration::from_millis(5), || Ok(()))
            .unwrap_err();
        assert!(matches!(err, NetlinkError::StartupTimeout { timeout_ms: 30, .. }));
    }

    #[test]
    fn test_wait_aborts_when_process_died() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wlan0");
        let err = wait_for_path(&path, Duration::from_secs(5), Duration::from_millis(5), || {
            Err(NetlinkError::SupplicantExited("exit status: 255".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, NetlinkError::SupplicantExited(_)));
    }

    #[test]
    fn test_line_receiver_drain_and_close() {
        let (tx, rx) = mpsc::channel();
        let mut events = LineReceiver::new(rx);
        tx.send("stale 1".to_string()).unwrap();
        tx.send("stale 2".to_string()).unwrap();
        assert_eq!(events.drain(), 2);
        assert_eq!(events.drain(), 0);

        tx.send("WPS: Received M1".to_string()).unwrap();
        drop(tx);
        assert_eq!(events.next_line().unwrap().as_deref(), Some("WPS: Received M1"));
        assert_eq!(events.next_line().unwrap(), None);
    }

    #[test]
    fn test_line_reader_splits_and_trims() {
        let (tx, rx) = mpsc::channel();
        let input = std::io::Cursor::new(b"first\r\nsecond\n\xffthird".to_vec());
        spawn_line_reader("test", input, tx);
        let lines: Vec<String> = rx.iter().collect();
        assert_eq!(lines, vec!["first", "second", "\u{fffd}third"]);
    }

    #[test]
    fn test_handle_terminate_removes_session_dir() {
        let root = tempfile::tempdir().unwrap();
        let session = root.path().join("session");
        fs::create_dir(&session).unwrap();
        fs::write(session.join(CONF_NAME), b"ctrl_interface=x\n").unwrap();

        // pgid 0 is never signalled
        let handle = SupplicantHandle::new(0, session.clone());
        handle.terminate();
        assert!(!session.exists());
        handle.terminate();
    }

    #[test]
    fn test_spawn_missing_binary() {
        let mut config = SupplicantConfig::new("wlan0");
        config.program = "/nonexistent/pixiejack-wpa_supplicant".to_string();
        match SupplicantProcess::spawn(&config) {
            Err(NetlinkError::Spawn { program, .. }) => assert_eq!(program, config.program),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("spawn should fail"),
        }
    }

    #[test]
    fn test_spawn_rejects_empty_interface() {
        let config = SupplicantConfig::new("");
        assert!(matches!(
            SupplicantProcess::spawn(&config),
            Err(NetlinkError::InvalidInput(_))
        ));
    }
}
