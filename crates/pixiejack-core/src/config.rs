use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pixiejack_netlink::{SupplicantConfig, DEFAULT_IW, DEFAULT_PIXIEWPS, DEFAULT_SUPPLICANT};

pub const DEFAULT_ROOT_PATH: &str = ".";
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_READY_POLL_MS: u64 = 100;
pub const DEFAULT_CTRL_TIMEOUT_MS: u64 = 5_000;
pub const CREDENTIALS_FILE: &str = "store/pixiejack_creds.txt";
pub const COMPONENT: &str = "pixiejack";

/// Runtime settings. Environment first, CLI flags applied on top.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub root_path: PathBuf,
    pub supplicant_bin: String,
    pub pixiewps_bin: String,
    pub iw_bin: String,
    pub startup_timeout: Duration,
    pub ready_poll: Duration,
    pub ctrl_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from(DEFAULT_ROOT_PATH),
            supplicant_bin: DEFAULT_SUPPLICANT.to_string(),
            pixiewps_bin: DEFAULT_PIXIEWPS.to_string(),
            iw_bin: DEFAULT_IW.to_string(),
            startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
            ready_poll: Duration::from_millis(DEFAULT_READY_POLL_MS),
            ctrl_timeout: Duration::from_millis(DEFAULT_CTRL_TIMEOUT_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let string = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            root_path: lookup("PIXIEJACK_ROOT")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.root_path),
            supplicant_bin: string("PIXIEJACK_SUPPLICANT", defaults.supplicant_bin),
            pixiewps_bin: string("PIXIEJACK_PIXIEWPS", defaults.pixiewps_bin),
            iw_bin: string("PIXIEJACK_IW", defaults.iw_bin),
            startup_timeout: millis("PIXIEJACK_STARTUP_TIMEOUT_MS", defaults.startup_timeout),
            ready_poll: millis("PIXIEJACK_READY_POLL_MS", defaults.ready_poll),
            ctrl_timeout: millis("PIXIEJACK_CTRL_TIMEOUT_MS", defaults.ctrl_timeout),
        }
    }

    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.root_path = root;
        }
        self
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.root_path.join(CREDENTIALS_FILE)
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    pub fn supplicant(&self, interface: &str) -> SupplicantConfig {
        SupplicantConfig {
            program: self.supplicant_bin.clone(),
            interface: interface.to_string(),
            startup_timeout: self.startup_timeout,
            poll_interval: self.ready_poll,
        }
    }
}
