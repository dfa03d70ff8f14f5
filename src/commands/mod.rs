pub mod config;
pub mod plan;
pub mod pod;

use crate::Context;
use crate::config::SkyformConfig;
use crate::paths;
use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Parse a JSON document from `path`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Effective config for this invocation
pub fn load_config(ctx: &Context) -> Result<SkyformConfig> {
    let path = paths::config_file(ctx.config_override.as_deref())?;
    SkyformConfig::load(&path)
}
