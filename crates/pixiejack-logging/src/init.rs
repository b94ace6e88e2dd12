use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::fs::log_dir;
use crate::targets::SUBSYSTEM_LOGS;

/// Keeps the non-blocking file writers flushing. Drop it last.
pub struct LoggingGuards {
    _file_guards: Vec<WorkerGuard>,
}

impl LoggingGuards {
    #[cfg(test)]
    fn file_writers(&self) -> usize {
        self._file_guards.len()
    }
}

/// Install the global subscriber.
///
/// Terminal output goes to stderr at `console_level`; `<root>/logs/<component>.log`
/// and the subsystem logs roll daily at `level`. When the log directory cannot
/// be created only terminal logging is installed. Calling this twice keeps the
/// first subscriber.
pub fn init(component: &str, root: &Path, cfg: &LoggingConfig) -> Result<LoggingGuards> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(build_filter(cfg, &cfg.console_level));

    let base = tracing_subscriber::registry()
        .with(build_filter(cfg, &cfg.level))
        .with(ErrorLayer::default())
        .with(console_layer);

    let mut guards = Vec::new();
    let dir = log_dir(root);

    if let Err(err) = std::fs::create_dir_all(&dir) {
        base.try_init().ok();
        let _ = LogTracer::init();
        tracing::warn!("File logging disabled ({}): {}", dir.display(), err);
        return Ok(LoggingGuards {
            _file_guards: guards,
        });
    }

    let component_appender = tracing_appender::rolling::daily(&dir, format!("{component}.log"));
    let (component_writer, component_guard) = tracing_appender::non_blocking(component_appender);
    let component_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_writer(component_writer)
        .with_filter(component_targets());
    guards.push(component_guard);

    let mut subsystem_layers = Vec::new();
    for (target, filename) in SUBSYSTEM_LOGS {
        let (layer, guard) = subsystem_layer(&dir, filename, target);
        subsystem_layers.push(layer);
        guards.push(guard);
    }

    base.with(component_layer)
        .with(subsystem_layers)
        .try_init()
        .ok();
    let _ = LogTracer::init();

    tracing::debug!(
        "Logging initialized for {} in {} ({} file writers)",
        component,
        dir.display(),
        guards.len()
    );

    Ok(LoggingGuards {
        _file_guards: guards,
    })
}

fn build_filter(cfg: &LoggingConfig, directive: &str) -> EnvFilter {
    if !cfg.enabled {
        return EnvFilter::new("off");
    }
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn component_targets() -> Targets {
    SUBSYSTEM_LOGS
        .iter()
        .fold(Targets::new().with_default(LevelFilter::TRACE), |targets, (target, _)| {
            targets.with_target(*target, LevelFilter::OFF)
        })
}

fn subsystem_layer<S>(
    log_dir: &Path,
    filename: &str,
    target: &'static str,
) -> (Box<dyn Layer<S> + Send + Sync>, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let appender = tracing_appender::rolling::daily(log_dir, filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_writer(writer)
        .with_filter(Targets::new().with_target(target, LevelFilter::TRACE))
        .boxed();
    (layer, guard)
}
