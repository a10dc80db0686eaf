use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/ldl/config.toml`.
///
/// Everything here is a default the CLI can override per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdlConfig {
    /// Maximum number of transfers running at once.
    pub max_parallel: usize,
    /// Scheduler poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Prefix downloaded filenames with their sequence number.
    pub numerate_files: bool,
    /// Lower bound of the per-item pause after each transfer, in milliseconds.
    #[serde(default)]
    pub min_pause_ms: Option<u64>,
    /// Upper bound of the per-item pause after each transfer, in milliseconds.
    #[serde(default)]
    pub max_pause_ms: Option<u64>,
}

impl Default for LdlConfig {
    fn default() -> Self {
        Self {
            max_parallel: 2,
            poll_interval_ms: 200,
            numerate_files: false,
            min_pause_ms: None,
            max_pause_ms: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ldl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: LdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
