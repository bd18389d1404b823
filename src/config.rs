//! Shade configuration and state locations

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::shell::notification_panel::PanelConfig;

/// State directory (`$XDG_STATE_HOME/flick`, `~/.local/state/flick` or `/tmp/flick`)
pub fn state_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("flick")
}

/// Shade configuration, read from `shade.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadeConfig {
    pub panel: PanelConfig,
    /// Settings file, defaults to `settings.toml` in the state directory
    pub settings_path: Option<PathBuf>,
}

impl ShadeConfig {
    pub fn default_path() -> PathBuf {
        state_dir().join("shade.toml")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(|| state_dir().join("settings.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load config from file, or return defaults if missing or invalid
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No shade config found, using defaults");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded shade config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), "Invalid shade config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Saved shade config");
        Ok(())
    }
}
