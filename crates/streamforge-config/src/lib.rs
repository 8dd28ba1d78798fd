//! Configuration for StreamForge constraint networks.
//!
//! Controls assertion modes, constraint match retention and constraint weight
//! overrides without code changes.
//!
//! # Examples
//!
//! ```
//! use streamforge_config::{EnvironmentMode, NetworkConfig};
//! use streamforge_core::HardSoftScore;
//!
//! let config = NetworkConfig::from_toml_str(r#"
//!     environment_mode = "full_assert"
//!     constraint_match_enabled = false
//!
//!     [constraint_weights]
//!     "queens/Row conflict" = "-2hard/0soft"
//! "#).unwrap();
//!
//! assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
//! assert!(config.environment_mode.is_asserted());
//! let weights = config.parsed_weights::<HardSoftScore>().unwrap();
//! assert_eq!(weights["queens/Row conflict"], HardSoftScore::of(-2, 0));
//! ```
//!
//! Use the defaults when the file is missing:
//!
//! ```
//! use streamforge_config::NetworkConfig;
//!
//! let config = NetworkConfig::load("network.toml").unwrap_or_default();
//! assert!(config.constraint_match_enabled);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use streamforge_core::ParseableScore;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration of one constraint network and its score directors.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct NetworkConfig {
    /// Environment mode affecting reproducibility and assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Whether scorers retain the matched facts and justification of every
    /// match. Disabling it only keeps the impact sums.
    #[serde(default = "default_true")]
    pub constraint_match_enabled: bool,

    /// Weight overrides by full constraint name, in score string form
    /// (for example `"-1hard/0soft"`).
    #[serde(default)]
    pub constraint_weights: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment_mode: EnvironmentMode::default(),
            constraint_match_enabled: true,
            constraint_weights: BTreeMap::new(),
        }
    }
}

impl NetworkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    pub fn with_constraint_match_enabled(mut self, enabled: bool) -> Self {
        self.constraint_match_enabled = enabled;
        self
    }

    /// Overrides the weight of a constraint, by full name.
    pub fn with_constraint_weight(
        mut self,
        constraint: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        self.constraint_weights
            .insert(constraint.into(), weight.into());
        self
    }

    /// Parses every weight override as the score type of the network.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first unparseable weight.
    pub fn parsed_weights<Sc: ParseableScore>(&self) -> Result<BTreeMap<String, Sc>, ConfigError> {
        self.constraint_weights
            .iter()
            .map(|(name, weight)| {
                Sc::parse(weight)
                    .map(|score| (name.clone(), score))
                    .map_err(|e| {
                        ConfigError::Invalid(format!(
                            "weight '{}' of constraint '{}': {}",
                            weight, name, e
                        ))
                    })
            })
            .collect()
    }
}

/// Environment mode affecting network behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// No checks, minimal overhead.
    #[default]
    NonReproducible,

    /// Deterministic behavior, no checks.
    Reproducible,

    /// Every score calculation is compared with a from-scratch rebuild.
    FastAssert,

    /// Like `FastAssert`, and every fact mutation is verified as well.
    FullAssert,
}

impl EnvironmentMode {
    /// Whether incremental scores are verified against from-scratch rebuilds.
    pub fn is_asserted(self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }

    pub fn is_fully_asserted(self) -> bool {
        self == EnvironmentMode::FullAssert
    }
}

#[cfg(test)]
mod tests;
