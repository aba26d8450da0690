//! Orchestrator configuration
//!
//! Read from the TOML file named by `PLAYBACK_HUB_CONFIG`, or
//! `playback-hub.toml` in the working directory; every field has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_ENV_VAR: &str = "PLAYBACK_HUB_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "playback-hub.toml";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Minimum time between two switch requests from the same surface
    pub activation_debounce_ms: u64,
    /// Share of the duration after which the guidance prompt fires
    pub guidance_fraction: f64,
    /// How often progress is written while playing
    pub progress_save_interval_secs: u64,
    pub progress_file: PathBuf,
    pub pip: PipSettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipSettings {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            activation_debounce_ms: 300,
            guidance_fraction: 0.3,
            progress_save_interval_secs: 5,
            progress_file: PathBuf::from(".cache/progress.json"),
            pip: PipSettings::default(),
        }
    }
}

impl Default for PipSettings {
    fn default() -> Self {
        Self {
            width: 135.0,
            height: 240.0,
            margin: 12.0,
        }
    }
}

impl OrchestratorConfig {
    /// Load from the environment-selected file, the default file, or defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config.validated())
    }

    fn validated(mut self) -> Self {
        if !(self.guidance_fraction > 0.0 && self.guidance_fraction <= 1.0) {
            tracing::warn!(
                guidance_fraction = self.guidance_fraction,
                "guidance_fraction out of range, using default"
            );
            self.guidance_fraction = Self::default().guidance_fraction;
        }
        self
    }

    pub fn activation_debounce(&self) -> Duration {
        Duration::from_millis(self.activation_debounce_ms)
    }

    pub fn progress_save_interval(&self) -> Duration {
        Duration::from_secs(self.progress_save_interval_secs)
    }
}
