//! Engine configuration loading and validation.
//!
//! Resolution order: explicit path → `LCM_ENGINE_CONFIG` → built-in defaults.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming an engine config file.
pub const ENV_CONFIG_PATH: &str = "LCM_ENGINE_CONFIG";

/// Default clamp applied to conditional probabilities before `ln`.
pub const DEFAULT_PROBABILITY_FLOOR: f64 = 1e-9;

/// Default batch size from which subjects are scored in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// What to do when a subject carries a required indicator with no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Fail that subject with `MissingValue`.
    #[default]
    Fail,
    /// Drop the indicator's factor for that subject only.
    Marginalize,
}

impl std::str::FromStr for MissingValuePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" | "error" => Ok(MissingValuePolicy::Fail),
            "marginalize" | "marginalise" | "skip" => Ok(MissingValuePolicy::Marginalize),
            _ => Err(format!("unknown missing value policy: {}", s)),
        }
    }
}

impl std::fmt::Display for MissingValuePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingValuePolicy::Fail => write!(f, "fail"),
            MissingValuePolicy::Marginalize => write!(f, "marginalize"),
        }
    }
}

/// Tunables for [`crate::PosteriorEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Conditional probabilities are clamped into `[floor, 1 - floor]`.
    /// Zero disables clamping.
    #[serde(default = "default_probability_floor")]
    pub probability_floor: f64,

    #[serde(default)]
    pub missing_values: MissingValuePolicy,

    /// Batches at least this large are scored across rayon workers.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_probability_floor() -> f64 {
    DEFAULT_PROBABILITY_FLOOR
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probability_floor: DEFAULT_PROBABILITY_FLOOR,
            missing_values: MissingValuePolicy::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidEngineConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse and validate a JSON config document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| Error::InvalidEngineConfig(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks on field ranges.
    pub fn validate(&self) -> Result<()> {
        let floor = self.probability_floor;
        if !floor.is_finite() || !(0.0..0.5).contains(&floor) {
            return Err(Error::InvalidEngineConfig(format!(
                "probability_floor must be in [0, 0.5), got {}",
                floor
            )));
        }
        if self.parallel_threshold == 0 {
            return Err(Error::InvalidEngineConfig(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_probability_floor(mut self, floor: f64) -> Self {
        self.probability_floor = floor;
        self
    }

    pub fn with_missing_values(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Where the engine config came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided path.
    CliArgument(PathBuf),
    /// Path taken from `LCM_ENGINE_CONFIG`.
    Environment(PathBuf),
    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument(p) => write!(f, "CLI argument ({})", p.display()),
            ConfigSource::Environment(p) => write!(f, "environment variable ({})", p.display()),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Resolve and load the engine config.
///
/// An explicit path wins, then `LCM_ENGINE_CONFIG` (ignored when empty),
/// then defaults. A named file that cannot be read or parsed is an error,
/// never a silent fallback.
pub fn resolve_config(cli_path: Option<&Path>) -> Result<(EngineConfig, ConfigSource)> {
    if let Some(path) = cli_path {
        let config = EngineConfig::from_file(path)?;
        return Ok((config, ConfigSource::CliArgument(path.to_path_buf())));
    }

    if let Ok(value) = std::env::var(ENV_CONFIG_PATH) {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            let config = EngineConfig::from_file(&path)?;
            return Ok((config, ConfigSource::Environment(path)));
        }
    }

    Ok((EngineConfig::default(), ConfigSource::BuiltinDefault))
}
