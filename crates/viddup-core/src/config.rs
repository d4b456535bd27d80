//! Layered configuration for the duplicate-detection pipeline.
//!
//! A top-level struct split into sections, each field defaulted
//! independently so a partial TOML file is still valid, with compiled-in
//! defaults the bottom layer of the stack (defaults -> TOML file -> CLI
//! flags, applied by the caller).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;

/// Top-level configuration. Every section has a `Default` impl, so
/// `Config::default()` alone is a usable configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            window: WindowConfig::default(),
            search: SearchConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Scene extractor parameters (component B).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SceneConfig {
    /// Minimum spacing between retained peaks, in seconds (`D`).
    #[serde(default = "default_min_peak_spacing_secs")]
    pub min_peak_spacing_secs: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            min_peak_spacing_secs: default_min_peak_spacing_secs(),
        }
    }
}

fn default_min_peak_spacing_secs() -> f64 {
    10.0
}

/// Window assembler parameters (component E).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WindowConfig {
    /// Fixed window length `L`, in fingerprint entries.
    #[serde(default = "default_window_len")]
    pub window_len: usize,
    /// Scene cap `S`, in seconds.
    #[serde(default = "default_scene_cap_secs")]
    pub scene_cap_secs: f64,
    /// Leading trim `T0`, in seconds.
    #[serde(default = "default_trim_start_secs")]
    pub trim_start_secs: f64,
    /// Trailing trim `T1`, in seconds.
    #[serde(default = "default_trim_end_secs")]
    pub trim_end_secs: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_len: default_window_len(),
            scene_cap_secs: default_scene_cap_secs(),
            trim_start_secs: default_trim_start_secs(),
            trim_end_secs: default_trim_end_secs(),
        }
    }
}

fn default_window_len() -> usize {
    10
}
fn default_scene_cap_secs() -> f64 {
    300.0
}
fn default_trim_start_secs() -> f64 {
    0.0
}
fn default_trim_end_secs() -> f64 {
    0.0
}

/// Duplicate reducer / ANN parameters (components F, G).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchConfig {
    /// Row step `sigma` when scanning the ANN index.
    #[serde(default = "default_step")]
    pub step: usize,
    /// L2 radius `r` for neighbor queries.
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Name of the ANN backend to use (`flat`, `grid`, ...).
    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            step: default_step(),
            radius: default_radius(),
            backend: default_backend(),
        }
    }
}

fn default_step() -> usize {
    1
}
fn default_radius() -> f64 {
    3.0
}
fn default_backend() -> String {
    "flat".to_string()
}

/// Ingest / Store parameters (components C, D).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StoreConfig {
    /// File extensions considered during ingest (without the leading dot,
    /// compared case-insensitively).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// `PRAGMA busy_timeout` bound, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["mp4", "mkv", "avi", "mov", "webm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_busy_timeout_ms() -> u32 {
    // >= 5 minutes, to tolerate a concurrent search while ingest holds a write lock.
    5 * 60 * 1000
}

impl Config {
    /// Load a configuration from a TOML file, layering it on top of defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field and range invariants not expressible via serde defaults.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.scene.min_peak_spacing_secs <= 0.0 {
            return Err(CoreError::InvalidConfig(
                "scene.min_peak_spacing_secs must be positive".into(),
            ));
        }
        if self.window.window_len == 0 {
            return Err(CoreError::InvalidConfig(
                "window.window_len must be at least 1".into(),
            ));
        }
        if self.window.scene_cap_secs <= 0.0 {
            return Err(CoreError::InvalidConfig(
                "window.scene_cap_secs must be positive".into(),
            ));
        }
        if self.window.trim_start_secs < 0.0 || self.window.trim_end_secs < 0.0 {
            return Err(CoreError::InvalidConfig(
                "window trims must be non-negative".into(),
            ));
        }
        if self.search.step == 0 {
            return Err(CoreError::InvalidConfig(
                "search.step must be at least 1".into(),
            ));
        }
        if self.search.radius <= 0.0 {
            return Err(CoreError::InvalidConfig(
                "search.radius must be positive".into(),
            ));
        }
        if self.store.extensions.is_empty() {
            return Err(CoreError::InvalidConfig(
                "store.extensions must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_matches_documented_constants() {
        let config = Config::default();
        assert_eq!(config.scene.min_peak_spacing_secs, 10.0);
        assert_eq!(config.window.window_len, 10);
        assert_eq!(config.window.scene_cap_secs, 300.0);
        assert_eq!(config.search.step, 1);
        assert_eq!(config.search.backend, "flat");
        assert_eq!(config.store.busy_timeout_ms, 300_000);
    }

    #[test]
    fn rejects_zero_window_len() {
        let mut config = Config::default();
        config.window.window_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml_str = r#"
            [scene]
            min_peak_spacing_secs = 5.0
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scene.min_peak_spacing_secs, 5.0);
        assert_eq!(config.window.window_len, 10);
        assert_eq!(config.search.backend, "flat");
    }

    #[test]
    fn rejects_empty_extensions() {
        let mut config = Config::default();
        config.store.extensions.clear();
        assert!(config.validate().is_err());
    }
}
