//! CLI configuration: provider settings plus pod command defaults

use anyhow::{Context, Result};
use cloudkit::{ProviderConfig, SessionConfig, WaitSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Defaults for the pod commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodDefaults {
    /// Namespace of the secret lookup when the pod names none
    pub namespace: String,
    /// Attribute path of the pod spec block in planned trees
    pub prefix: String,
    /// Pointer prefix of emitted patch paths
    pub pointer: String,
}

impl Default for PodDefaults {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            prefix: "spec.0".to_string(),
            pointer: "/spec".to_string(),
        }
    }
}

/// Contents of config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyformConfig {
    pub session: SessionConfig,
    pub wait: WaitSettings,
    pub pod: PodDefaults,
}

impl SkyformConfig {
    /// Load config from `path`; a missing file means defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig {
            session: self.session.clone(),
            wait: self.wait.clone(),
        }
    }

    /// Copy safe to print
    pub fn masked(&self) -> Self {
        let provider = self.provider().masked();
        Self {
            session: provider.session,
            wait: provider.wait,
            pod: self.pod.clone(),
        }
    }
}
