//! Advisor Configuration - optimizer budget, sampler tuning, objective weights
//! and search bounds as operator-tunable TOML values
//!
//! Each struct implements `Default` with the built-in constants from
//! [`super::defaults`], so a run without any config file behaves exactly like
//! the shipped advisor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::optimization::SearchSpace;
use crate::surrogate::artifacts::DEFAULT_ARTIFACT_DIR;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AdvisorConfig::load()` which searches:
/// 1. `$SETPOINT_ADVISOR_CONFIG` env var
/// 2. `./advisor_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Where trained surrogates live
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Trial budget and seed
    #[serde(default)]
    pub optimizer: OptimizerSettings,

    /// Parzen estimator tuning
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Composite score and quality constraint
    #[serde(default)]
    pub objective: ObjectiveConfig,

    /// Controllable levers and their bounds
    #[serde(default)]
    pub search_space: SearchSpace,
}

impl AdvisorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SETPOINT_ADVISOR_CONFIG` environment variable
    /// 2. `./advisor_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(
                            path = %p.display(),
                            "Loaded advisor config from {}",
                            defaults::CONFIG_ENV_VAR
                        );
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load advisor config, falling back"
                        );
                    }
                }
            } else {
                warn!(
                    path = %path,
                    "{} points to non-existent file, falling back",
                    defaults::CONFIG_ENV_VAR
                );
            }
        }

        // 2. Check ./advisor_config.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded advisor config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Failed to load ./{}, using defaults",
                        defaults::LOCAL_CONFIG_FILE
                    );
                }
            }
        }

        // 3. Defaults
        info!("No advisor config found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
                other => other,
            })?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject impossible values; log suspicious ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding `feature_cols.json` and the model documents
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_DIR)
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Trials per run (`--trials` overrides)
    pub n_trials: usize,
    /// Uniform exploration trials before model-guided proposals
    pub n_startup_trials: usize,
    /// Sampler seed
    pub seed: u64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            n_trials: defaults::N_TRIALS,
            n_startup_trials: defaults::N_STARTUP_TRIALS,
            seed: defaults::SEED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Candidates drawn from l(x) per proposal
    pub n_ei_candidates: usize,
    /// Upper bound on the good-trial set
    pub max_good_trials: usize,
    /// Fraction of history in the good-trial set
    pub good_fraction: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_ei_candidates: defaults::N_EI_CANDIDATES,
            max_good_trials: defaults::MAX_GOOD_TRIALS,
            good_fraction: defaults::GOOD_FRACTION,
        }
    }
}

/// Composite score definition.
///
/// `score = w_y·yield/n_y + w_o·output/n_o − w_e·energy/n_e − w_s·scrap/n_s`,
/// replaced by `−quality_penalty × (threshold − q)` when `q < threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    pub quality_pass_threshold: f64,
    pub quality_penalty: f64,
    pub weights: ObjectiveTerms,
    pub normalization: ObjectiveTerms,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            quality_pass_threshold: defaults::QUALITY_PASS_THRESHOLD,
            quality_penalty: defaults::QUALITY_PENALTY,
            weights: ObjectiveTerms {
                yield_pct: defaults::WEIGHT_YIELD,
                steel_output_tons: defaults::WEIGHT_OUTPUT,
                energy_cost_usd: defaults::WEIGHT_ENERGY,
                scrap_rate_pct: defaults::WEIGHT_SCRAP,
            },
            normalization: ObjectiveTerms {
                yield_pct: defaults::NORM_YIELD_PCT,
                steel_output_tons: defaults::NORM_OUTPUT_TONS,
                energy_cost_usd: defaults::NORM_ENERGY_USD,
                scrap_rate_pct: defaults::NORM_SCRAP_PCT,
            },
        }
    }
}

/// One value per objective term. Used for both weights and normalizers;
/// missing keys are zero, so a partial `[objective.weights]` table only
/// keeps the terms it names.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveTerms {
    pub yield_pct: f64,
    pub steel_output_tons: f64,
    pub energy_cost_usd: f64,
    pub scrap_rate_pct: f64,
}

impl ObjectiveTerms {
    pub(crate) fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("yield_pct", self.yield_pct),
            ("steel_output_tons", self.steel_output_tons),
            ("energy_cost_usd", self.energy_cost_usd),
            ("scrap_rate_pct", self.scrap_rate_pct),
        ]
    }
}
