//! Command implementations for the logship CLI

pub mod config;
pub mod index;
pub mod parse;
pub mod replay;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use logship_config::Config;
use tracing::info;

/// Config file locations tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: &[&str] = &["configs/logship.toml", "logship.toml"];

/// Configuration and where it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config was read from, if any
    pub path: Option<PathBuf>,
    /// `LOGSHIP_*` variables applied on top of the file
    pub overrides: Vec<String>,
}

impl LoadedConfig {
    /// Log the config source; call once logging is initialized
    pub fn log_source(&self) {
        match &self.path {
            Some(path) => info!(config = %path.display(), "using config file"),
            None => info!("no config file found, using defaults"),
        }
        if !self.overrides.is_empty() {
            info!(overrides = ?self.overrides, "environment overrides applied");
        }
    }
}

/// Load the config file and apply environment overrides
///
/// An explicit path must exist. Without one, the default locations are
/// tried in order and built-in defaults are used if none exists.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with(path, std::env::vars())
}

fn load_config_with(
    path: Option<&Path>,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<LoadedConfig> {
    let path = match path {
        Some(path) if !path.exists() => {
            anyhow::bail!("config file not found: {}", path.display());
        }
        Some(path) => Some(path.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists()),
    };

    let mut config = match &path {
        Some(path) => Config::from_file(path).context("failed to load configuration")?,
        None => Config::default(),
    };
    let overrides = config
        .apply_env_from(vars)
        .context("failed to apply environment overrides")?;
    config
        .validate()
        .context("invalid configuration after environment overrides")?;

    Ok(LoadedConfig {
        config,
        path,
        overrides,
    })
}
