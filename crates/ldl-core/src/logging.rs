//! Logging setup.
//!
//! The console progress view owns stdout, so log records go to a file under
//! the XDG state dir. Callers fall back to [`init_logging_stderr`] when the
//! file cannot be opened.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,ldl=debug";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file, `~/.local/state/ldl/ldl.log` by default. Creates
/// the parent directory.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ldl")?;
    Ok(xdg_dirs.place_state_file("ldl.log")?)
}

/// Initializes logging to the state-dir log file.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("logging to {}", path.display());
    Ok(())
}

/// Stderr-only logging, for when the log file is unavailable.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_is_under_the_app_state_dir() {
        let path = log_file_path().unwrap();
        assert!(path.ends_with("ldl/ldl.log"), "got {}", path.display());
    }
}
