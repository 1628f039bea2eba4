//! Advisor Configuration Module
//!
//! Optimizer budget, sampler tuning, objective weights and search bounds
//! loaded from TOML, replacing hardcoded constants with operator-tunable
//! values.
//!
//! ## Loading Order
//!
//! 1. `SETPOINT_ADVISOR_CONFIG` environment variable (path to TOML file)
//! 2. `advisor_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is a plain value handed to whoever needs it, so optimizers
//! with different weightings can coexist:
//!
//! ```ignore
//! let config = AdvisorConfig::load();
//! let optimizer = SetpointOptimizer::from_artifacts(&config.artifacts.dir, &config)?;
//! ```

mod advisor_config;
pub mod defaults;
pub mod validation;

pub use advisor_config::*;
