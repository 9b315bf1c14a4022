// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the dynamics engine.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. dynamics.yaml file
//! 3. Environment variables (QUBITOS_*)
//! 4. CLI arguments

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::aggregate::AggregationConfig;
use crate::error::{Error, Result};
use crate::lindblad::IntegratorConfig;
use crate::tolerance::Tolerances;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Numerical tolerances
    #[serde(default)]
    pub tolerances: Tolerances,

    /// Integrator settings
    #[serde(default)]
    pub integrator: IntegratorConfig,

    /// Aggregation settings
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        } else {
            for path in &["dynamics.yaml", "dynamics.yml", "/etc/qubitos/dynamics.yaml"] {
                let path = Path::new(path);
                if path.exists() {
                    config = Self::from_file(path)?;
                    break;
                }
            }
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("QUBITOS_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("QUBITOS_LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("QUBITOS_INTEGRATOR_METHOD") {
            self.integrator.method = val.parse()?;
        }
        if let Ok(val) = env::var("QUBITOS_MAX_STEP") {
            self.integrator.max_step = parse_number("QUBITOS_MAX_STEP", &val)?;
        }
        if let Ok(val) = env::var("QUBITOS_TOLERANCE") {
            self.tolerances = Tolerances::uniform(parse_number("QUBITOS_TOLERANCE", &val)?);
        }
        if let Ok(val) = env::var("QUBITOS_PARALLEL") {
            self.aggregation.parallel = parse_flag(&val);
        }
        if let Ok(val) = env::var("QUBITOS_REDUCER") {
            self.aggregation.reducer = val.parse()?;
        }
        if let Ok(val) = env::var("QUBITOS_STRICT_VALIDATION") {
            self.validation.strict = parse_flag(&val);
        }
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerances.is_valid() {
            return Err(Error::Config(format!(
                "tolerances must be finite and positive: {:?}",
                self.tolerances
            )));
        }
        self.integrator.validate()?;
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(Error::Config(format!(
                "logging.format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            )));
        }
        if self.validation.limits.max_exact_dim > self.validation.limits.max_hilbert_dim {
            return Err(Error::Config(
                "validation.limits.max_exact_dim cannot exceed max_hilbert_dim".into(),
            ));
        }
        if !self.validation.strict {
            tracing::warn!(
                "Strict validation is disabled. Resource limits will not be enforced. \
                 Set QUBITOS_STRICT_VALIDATION=true for shared deployments."
            );
        }
        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

fn parse_number(name: &str, val: &str) -> Result<f64> {
    val.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a number, got '{val}'")))
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Strict validation mode
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Resource limits
    #[serde(default)]
    pub limits: ResourceLimits,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: true,
            limits: ResourceLimits::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Resource limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum Hilbert space dimension
    #[serde(default = "default_max_hilbert_dim")]
    pub max_hilbert_dim: u32,

    /// Maximum dimension for the exact propagator (N² × N² Liouvillian)
    #[serde(default = "default_max_exact_dim")]
    pub max_exact_dim: u32,

    /// Maximum time grid points
    #[serde(default = "default_max_grid_points")]
    pub max_grid_points: u32,

    /// Maximum initial states per run
    #[serde(default = "default_max_items")]
    pub max_states: u32,

    /// Maximum measures per run
    #[serde(default = "default_max_items")]
    pub max_measures: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_hilbert_dim: default_max_hilbert_dim(),
            max_exact_dim: default_max_exact_dim(),
            max_grid_points: default_max_grid_points(),
            max_states: default_max_items(),
            max_measures: default_max_items(),
        }
    }
}

fn default_max_hilbert_dim() -> u32 {
    64
}

fn default_max_exact_dim() -> u32 {
    16
}

fn default_max_grid_points() -> u32 {
    100_000
}

fn default_max_items() -> u32 {
    256
}
