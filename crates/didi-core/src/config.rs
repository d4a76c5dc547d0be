//! Configuration model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DidiError, Result};

/// Root configuration (`config.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidiConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub endorser: EndorserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_did_method")]
    pub did_method: String,
    #[serde(default = "default_did_namespace")]
    pub did_namespace: String,
}

fn default_label() -> String {
    "alice".to_string()
}

fn default_port() -> u16 {
    3006
}

fn default_did_method() -> String {
    "indy".to_string()
}

fn default_did_namespace() -> String {
    "bcovrin:test".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            port: default_port(),
            did_method: default_did_method(),
            did_namespace: default_did_namespace(),
        }
    }
}

/// Identity used once to endorse the agent's own DID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorserConfig {
    pub did: Option<String>,
    pub seed: Option<String>,
}

impl EndorserConfig {
    /// Returns `(did, seed)`, failing when either is absent or blank.
    pub fn require(&self) -> Result<(&str, &str)> {
        let did = self
            .did
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| DidiError::config("endorser DID is not configured (DIDI_ENDORSER_DID)"))?;
        let seed = self
            .seed
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| DidiError::config("endorser seed is not configured (DIDI_ENDORSER_SEED)"))?;
        Ok((did, seed))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}
