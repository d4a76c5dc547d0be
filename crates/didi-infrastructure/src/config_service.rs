//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` and overlays
//! `DIDI_*` environment variables on top of it.

use std::fs;
use std::path::PathBuf;

use didi_core::config::DidiConfig;
use didi_core::error::Result;

use crate::paths::DidiPaths;

pub const ENV_ENDORSER_DID: &str = "DIDI_ENDORSER_DID";
pub const ENV_ENDORSER_SEED: &str = "DIDI_ENDORSER_SEED";
pub const ENV_DID_METHOD: &str = "DIDI_DID_METHOD";
pub const ENV_DID_NAMESPACE: &str = "DIDI_DID_NAMESPACE";
pub const ENV_DATA_DIR: &str = "DIDI_DATA_DIR";

/// Loads [`DidiConfig`] from a TOML file plus the process environment.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
}

impl ConfigService {
    /// Uses `path` when given, otherwise `~/.config/didi/config.toml`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Loads the configuration. A missing file yields defaults.
    pub fn load(&self) -> Result<DidiConfig> {
        let mut config = self.load_file()?;
        apply_env(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file(&self) -> Result<DidiConfig> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => DidiPaths::config_file()?,
        };

        if !path.exists() {
            tracing::debug!("[Config] No config file at {:?}, using defaults", path);
            return Ok(DidiConfig::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        tracing::info!("[Config] Loaded configuration from {:?}", path);
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Overlays environment values onto `config`. Empty values are ignored.
pub fn apply_env(config: &mut DidiConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(did) = var(ENV_ENDORSER_DID) {
        config.endorser.did = Some(did);
    }
    if let Some(seed) = var(ENV_ENDORSER_SEED) {
        config.endorser.seed = Some(seed);
    }
    if let Some(method) = var(ENV_DID_METHOD) {
        config.agent.did_method = method;
    }
    if let Some(namespace) = var(ENV_DID_NAMESPACE) {
        config.agent.did_namespace = namespace;
    }
    if let Some(dir) = var(ENV_DATA_DIR) {
        config.storage.data_dir = Some(PathBuf::from(dir));
    }
}
