//! Pipeline configuration.
//!
//! Settings come from an optional JSON file pointed to by `AXON_CONFIG`,
//! overridden by environment variables, then validated. Validation failure
//! prevents pipeline startup; nothing is silently defaulted to cover an
//! invalid value.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TARGET_FPS: u32 = 10;

#[derive(Debug, Deserialize, Default)]
struct AxonConfigFile {
    source: Option<String>,
    enable_blurring: Option<bool>,
    target_fps: Option<u32>,
}

/// Validated pipeline configuration.
#[derive(Debug, Clone)]
pub struct AxonConfig {
    /// Video source identifier (file path, image directory, or stub://).
    pub source: String,
    /// Blur detected regions in the presenter.
    pub enable_blurring: bool,
    /// Pacing hint for sources without intrinsic timing.
    pub target_fps: u32,
}

impl Default for AxonConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            enable_blurring: true,
            target_fps: DEFAULT_TARGET_FPS,
        }
    }
}

impl AxonConfig {
    /// Load from `AXON_CONFIG` (if set) and the environment, then validate.
    pub fn load() -> Result<Self> {
        Self::load_with_overrides(None, None)
    }

    /// Like `load`, but with the source and blur flag pinned by the caller
    /// (CLI arguments win over file and environment).
    pub fn load_with_overrides(
        source: Option<String>,
        enable_blurring: Option<bool>,
    ) -> Result<Self> {
        let file_cfg = match std::env::var("AXON_CONFIG").ok() {
            Some(path) => read_config_file(Path::new(&path))?,
            None => AxonConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        if let Some(source) = source {
            cfg.source = source;
        }
        if let Some(blur) = enable_blurring {
            cfg.enable_blurring = blur;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AxonConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            source: file.source.unwrap_or(defaults.source),
            enable_blurring: file.enable_blurring.unwrap_or(defaults.enable_blurring),
            target_fps: file.target_fps.unwrap_or(defaults.target_fps),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("AXON_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        if let Ok(blur) = std::env::var("AXON_BLURRING") {
            self.enable_blurring = parse_bool("AXON_BLURRING", &blur)?;
        }
        if let Ok(fps) = std::env::var("AXON_TARGET_FPS") {
            self.target_fps = fps
                .parse()
                .map_err(|_| anyhow!("AXON_TARGET_FPS must be an integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(anyhow!("source identifier is required and must be non-empty"));
        }
        if self.target_fps == 0 {
            return Err(anyhow!("target_fps must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<AxonConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(anyhow!("{} must be a boolean, got '{}'", name, value)),
    }
}
