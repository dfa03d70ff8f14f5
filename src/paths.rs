//! Path resolution for the skyform config file
//!
//! For config_dir():
//! 1. `XDG_CONFIG_HOME/skyform` (if set)
//! 2. Platform default:
//!    - Windows: `%APPDATA%\skyform`
//!    - macOS/Linux: `~/.config/skyform`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// File name of the config inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the skyform config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("skyform");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("skyform"));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("skyform");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Config file location: the expanded override, else the default file
pub fn config_file(config_override: Option<&str>) -> Result<PathBuf> {
    match config_override {
        Some(path) => Ok(expand(path)),
        None => Ok(config_dir()?.join(CONFIG_FILE)),
    }
}

/// `~` and `$VAR` expanded; an unknown variable leaves the text as given
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(err) => {
            log::warn!("Could not expand {path}: {err}");
            PathBuf::from(path)
        }
    }
}
