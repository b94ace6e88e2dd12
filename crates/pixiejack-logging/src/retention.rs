use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

use crate::config::LoggingConfig;
use crate::fs::log_dir;
use crate::targets::SUBSYSTEM_LOGS;

const MAX_LOG_BYTES: u64 = 50 * 1024 * 1024;

struct LogFile {
    path: PathBuf,
    modified: SystemTime,
    size: u64,
}

/// Delete rolled logs older than `keep_days`, then the oldest files until
/// the directory is under the size cap. Returns how many files were removed.
pub fn run_retention(root: &Path, component: &str, cfg: &LoggingConfig) -> Result<usize> {
    let files = collect_log_files(&log_dir(root), component)?;
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(
            cfg.keep_days.saturating_mul(24 * 60 * 60),
        ))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let doomed = plan_removals(files, cutoff, MAX_LOG_BYTES);
    let mut removed = 0;
    for file in &doomed {
        match fs::remove_file(&file.path) {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!("Could not prune {}: {}", file.path.display(), err),
        }
    }
    if removed > 0 {
        tracing::debug!("Pruned {} of {} planned log files", removed, doomed.len());
    }
    Ok(removed)
}

/// Oldest first: everything modified before `cutoff`, then survivors until
/// the remaining bytes fit in `cap`.
fn plan_removals(mut files: Vec<LogFile>, cutoff: SystemTime, cap: u64) -> Vec<LogFile> {
    files.sort_by_key(|f| f.modified);
    let mut remaining: u64 = files
        .iter()
        .filter(|f| f.modified >= cutoff)
        .map(|f| f.size)
        .sum();

    files
        .into_iter()
        .filter(|f| {
            if f.modified < cutoff {
                return true;
            }
            if remaining > cap {
                remaining = remaining.saturating_sub(f.size);
                return true;
            }
            false
        })
        .collect()
}

fn collect_log_files(dir: &Path, component: &str) -> Result<Vec<LogFile>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }

    let component_log = format!("{component}.log");
    let entries = fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("iterating {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if !is_log_name(name, &component_log) {
            continue;
        }

        let metadata = fs::metadata(&path).with_context(|| format!("stat {}", path.display()))?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push(LogFile {
            path,
            modified,
            size: metadata.len(),
        });
    }

    Ok(files)
}

fn is_log_name(name: &str, component_log: &str) -> bool {
    name.starts_with(component_log)
        || SUBSYSTEM_LOGS
            .iter()
            .any(|(_, filename)| name.starts_with(filename))
}
