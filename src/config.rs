//! Configuration module for the CLI defaults
//!
//! Reads/writes configuration from ~/.config/motion-bridge/motion.toml

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::kind::{SamplingTier, SensorKind};

/// CLI configuration: which sensors `watch` starts by default, and at which
/// tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default sampling tier for started sensors.
    #[serde(default)]
    pub tier: SamplingTier,

    /// Sensors started by a bare `watch`. Empty means all of them.
    #[serde(default)]
    pub sensors: Vec<SensorKind>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("motion-bridge").join("motion.toml"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> anyhow::Result<()> {
        let path =
            Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// The sensor set a bare `watch` starts.
    pub fn sensors(&self) -> Vec<SensorKind> {
        if self.sensors.is_empty() {
            SensorKind::ALL.to_vec()
        } else {
            self.sensors.clone()
        }
    }
}
