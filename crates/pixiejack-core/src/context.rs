//! Resources that must be released when the operator interrupts a run.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use pixiejack_netlink::SupplicantHandle;

use crate::report::Reporter;

/// Cleanup state shared between the driver and the interrupt handler.
#[derive(Debug, Default)]
pub struct SessionContext {
    supplicant: Option<SupplicantHandle>,
}

pub type SharedContext = Arc<Mutex<SessionContext>>;

impl SessionContext {
    pub fn shared() -> SharedContext {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn attach(&mut self, handle: SupplicantHandle) {
        self.supplicant = Some(handle);
    }

    /// Forget the supplicant after it was shut down normally.
    pub fn detach(&mut self) -> Option<SupplicantHandle> {
        self.supplicant.take()
    }

    #[cfg(test)]
    fn is_attached(&self) -> bool {
        self.supplicant.is_some()
    }

    /// Terminate the supplicant group and remove its session directory.
    /// Returns false when there was nothing to clean up.
    pub fn cleanup(&mut self) -> bool {
        match self.supplicant.take() {
            Some(handle) => {
                tracing::info!(
                    "Terminating supplicant group {} and removing {}",
                    handle.pgid(),
                    handle.session_dir().display()
                );
                handle.terminate();
                true
            }
            None => false,
        }
    }
}

/// Route SIGINT/SIGTERM to `ctx.cleanup()` followed by a clean exit.
pub fn install_interrupt_handler(ctx: SharedContext) -> Result<()> {
    ctrlc::set_handler(move || {
        let mut reporter = Reporter::stdout();
        reporter.line("");
        reporter.warn("Force Exiting...");
        match ctx.lock() {
            Ok(mut ctx) => {
                ctx.cleanup();
            }
            Err(poisoned) => {
                poisoned.into_inner().cleanup();
            }
        }
        std::process::exit(0);
    })
    .context("installing interrupt handler")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_without_supplicant() {
        let ctx = SessionContext::shared();
        let mut guard = ctx.lock().unwrap();
        assert!(!guard.is_attached());
        assert!(!guard.cleanup());
    }

    #[test]
    fn test_cleanup_runs_once() {
        let root = tempfile::tempdir().unwrap();
        let session = root.path().join("session");
        std::fs::create_dir(&session).unwrap();

        let mut ctx = SessionContext::default();
        ctx.attach(SupplicantHandle::new(0, session.clone()));
        assert!(ctx.is_attached());
        assert!(ctx.cleanup());
        assert!(!session.exists());
        assert!(!ctx.cleanup());
    }

    #[test]
    fn test_detach_skips_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let mut ctx = SessionContext::default();
        ctx.attach(SupplicantHandle::new(0, root.path().to_path_buf()));
        assert!(ctx.detach().is_some());
        assert!(!ctx.cleanup());
        assert!(root.path().exists());
    }
}
