use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "RDASH_LOG";

/// Default log file: `<cache_dir>/rdash/rdash.log`
fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("rdash").join("rdash.log"))
}

/// Filter priority: `RDASH_LOG` > `--verbose` > configured level
fn build_filter(config: &LogConfig, verbose: bool) -> EnvFilter {
    if let Ok(directive) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directive) {
            return filter;
        }
    }
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a file-backed subscriber; the terminal belongs to the dashboard.
/// Returns the log path, or `None` when no file could be opened (logging off).
pub fn init(config: &LogConfig, verbose: bool) -> Option<PathBuf> {
    let path = config.file.clone().or_else(default_log_path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = File::options().create(true).append(true).open(&path).ok()?;

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config, verbose))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(path)
}
