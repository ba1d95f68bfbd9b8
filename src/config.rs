//! Engine configuration
//!
//! Settings are read from a TOML file. Every section and field is optional
//! and falls back to the defaults below.
//!
//! ```toml
//! [score]
//! min = 0.0
//! max = 90.0
//!
//! [weights]
//! default_importance = 1.0
//!
//! [weights.importance]
//! Finance = 5.0
//! HR = 4.0
//!
//! [generator]
//! seed = 42
//! ceiling = 90
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::generator::DEFAULT_SCORE_CEILING;
use crate::types::ScoreRange;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub score: ScoreConfig,

    #[serde(default)]
    pub weights: WeightsConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Clamp range for the mean engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_min_score")]
    pub min: f64,

    #[serde(default = "default_max_score")]
    pub max: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            min: default_min_score(),
            max: default_max_score(),
        }
    }
}

impl ScoreConfig {
    pub fn range(&self) -> ScoreRange {
        ScoreRange {
            min: self.min,
            max: self.max,
        }
    }
}

fn default_min_score() -> f64 {
    ScoreRange::DEFAULT.min
}

fn default_max_score() -> f64 {
    ScoreRange::DEFAULT.max
}

/// Department importance weights applied to user-level input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Importance for departments not listed in `importance`
    #[serde(default = "default_importance")]
    pub default_importance: f64,

    /// Importance per department name
    #[serde(default)]
    pub importance: HashMap<String, f64>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            default_importance: default_importance(),
            importance: HashMap::new(),
        }
    }
}

fn default_importance() -> f64 {
    1.0
}

/// Synthetic data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Fixed seed for reproducible output; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Exclusive upper bound for generated department scores
    #[serde(default = "default_ceiling")]
    pub ceiling: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            ceiling: default_ceiling(),
        }
    }
}

fn default_ceiling() -> i64 {
    DEFAULT_SCORE_CEILING
}

impl EngineConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ComputeError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ComputeError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ComputeError> {
        self.score.range().validate()?;

        let weights = std::iter::once(("default_importance", self.weights.default_importance))
            .chain(
                self.weights
                    .importance
                    .iter()
                    .map(|(name, weight)| (name.as_str(), *weight)),
            );
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ComputeError::ConfigError(format!(
                    "importance for {} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        if self.generator.ceiling <= 0 {
            return Err(ComputeError::ConfigError(format!(
                "generator ceiling must be positive, got {}",
                self.generator.ceiling
            )));
        }

        Ok(())
    }

    /// Render the default configuration as TOML
    pub fn default_toml() -> Result<String, ComputeError> {
        toml::to_string_pretty(&EngineConfig::default())
            .map_err(|e| ComputeError::ConfigError(e.to_string()))
    }
}
