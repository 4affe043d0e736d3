//! Settings resolution: defaults, then config file, then flags and environment

use std::path::{Path, PathBuf};

use ami_core::AmiConfig;
use anyhow::{Context, Result};
use tracing::debug;

use crate::Cli;

const CONFIG_DIR: &str = "ami-endpoints";
const CONFIG_FILE: &str = "config.toml";

/// `<config dir>/ami-endpoints/config.toml`, when the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load a TOML config file; missing keys keep their defaults
pub fn load_file(path: &Path) -> Result<AmiConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

fn parse(text: &str) -> Result<AmiConfig> {
    Ok(toml::from_str(text)?)
}

/// Build the effective configuration for this invocation
///
/// An explicit `--config` must exist; the default location is only used when
/// present.
pub fn resolve(cli: &Cli) -> Result<AmiConfig> {
    let base = match &cli.config {
        Some(path) => load_file(path)?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => {
                debug!("Using config file {}", path.display());
                load_file(&path)?
            }
            None => AmiConfig::default(),
        },
    };
    Ok(apply_overrides(base, cli))
}

fn apply_overrides(mut config: AmiConfig, cli: &Cli) -> AmiConfig {
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(username) = &cli.username {
        config.username = username.clone();
    }
    if let Some(secret) = &cli.secret {
        config.secret = secret.clone();
    }
    if let Some(key) = cli.key_by {
        config.result_key = key.into();
    }
    config
}
