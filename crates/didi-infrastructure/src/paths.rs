//! Unified path management for didi files.
//!
//! ```text
//! ~/.config/didi/              # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/didi/         # Data directory
//! ├── wallets/                 # One record file per wallet
//! │   └── <wallet>.toml
//! └── logs/                    # Application logs
//!     └── didi.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

use didi_core::error::{DidiError, Result};

const APP_DIR: &str = "didi";

/// Resolves didi directories, honoring an optional data directory override.
#[derive(Debug, Clone)]
pub struct DidiPaths {
    data_dir_override: Option<PathBuf>,
}

impl DidiPaths {
    pub fn new(data_dir_override: Option<&Path>) -> Self {
        Self {
            data_dir_override: data_dir_override.map(Path::to_path_buf),
        }
    }

    /// Returns the didi configuration directory (e.g. `~/.config/didi/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DidiError::config("Cannot find config directory"))
    }

    /// Returns the default config file path.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the data directory (e.g. `~/.local/share/didi/`).
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir_override {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DidiError::config("Cannot find data directory"))
    }

    pub fn wallets_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("wallets"))
    }

    /// Returns the record file of a wallet. The wallet name is sanitized so it
    /// cannot escape the wallets directory.
    pub fn wallet_file(&self, wallet_id: &str) -> Result<PathBuf> {
        let name: String = wallet_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if name.is_empty() {
            return Err(DidiError::config("wallet name must not be empty"));
        }
        Ok(self.wallets_dir()?.join(format!("{name}.toml")))
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }
}
