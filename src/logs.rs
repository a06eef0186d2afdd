//! XDG-compliant log directory management
//!
//! A TUI cannot log to stdout, so tracing output goes to a file under
//! `$XDG_STATE_HOME/lucid/logs/` (typically `~/.local/state/lucid/logs/`).
//! Each instance uses a date+PID-based log file to support concurrent runs;
//! stale files from dead sessions are cleaned up on startup.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

/// Minimum age for log files to be cleaned up (24 hours)
const CLEANUP_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached log directory path
static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the base log directory, creating it if necessary.
///
/// Returns `$XDG_STATE_HOME/lucid/logs/`, falling back to
/// `~/.local/state/lucid/logs/` and, as a last resort, the system temp dir.
pub fn log_dir() -> &'static PathBuf {
    LOG_DIR.get_or_init(|| {
        let dir = xdg_log_dir().unwrap_or_else(|| std::env::temp_dir().join("lucid-logs"));

        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("failed to create log directory {:?}: {}", dir, e);
            return std::env::temp_dir().join("lucid-logs");
        }

        dir
    })
}

fn xdg_log_dir() -> Option<PathBuf> {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(state_home);
        if path.is_absolute() {
            return Some(path.join("lucid").join("logs"));
        }
    }

    if let Some(home) = home_dir() {
        return Some(home.join(".local").join("state").join("lucid").join("logs"));
    }

    None
}

fn home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }

    #[cfg(windows)]
    if let Ok(profile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(profile));
    }

    None
}

/// Get the path for this process's log file.
///
/// Returns `{log_dir}/lucid-{YYYYMMDD}-{PID}.log`
pub fn main_log_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y%m%d");
    log_dir().join(format!("lucid-{}-{}.log", date, std::process::id()))
}

/// Remove log files older than [`CLEANUP_AGE`].
///
/// Best-effort: failures are ignored, a missing directory is fine.
pub fn cleanup_stale_logs() {
    let Ok(entries) = fs::read_dir(log_dir()) else {
        return;
    };

    let now = SystemTime::now();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e != "log").unwrap_or(true) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if now
            .duration_since(modified)
            .map(|age| age > CLEANUP_AGE)
            .unwrap_or(false)
        {
            let _ = fs::remove_file(&path);
        }
    }
}
