//! Built-in default constants.
//!
//! These are the values the advisor runs with when no `advisor_config.toml`
//! is present. Grouped by subsystem.

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SETPOINT_ADVISOR_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "advisor_config.toml";

// ============================================================================
// Optimizer
// ============================================================================

/// Trials per optimization run.
pub const N_TRIALS: usize = 300;

/// Uniform exploration trials before the sampler starts modelling.
pub const N_STARTUP_TRIALS: usize = 30;

/// Sampler seed. Fixed so repeated runs recommend the same setpoints.
pub const SEED: u64 = 42;

// ============================================================================
// Sampler (tree-structured Parzen estimator)
// ============================================================================

/// Candidates drawn from the good-trial density per proposal.
pub const N_EI_CANDIDATES: usize = 24;

/// Cap on the size of the good-trial set.
pub const MAX_GOOD_TRIALS: usize = 25;

/// Share of history treated as good trials.
pub const GOOD_FRACTION: f64 = 0.1;

// ============================================================================
// Objective
// ============================================================================

/// Minimum acceptable P(quality_grade_pass).
pub const QUALITY_PASS_THRESHOLD: f64 = 0.85;

/// Score penalty per unit of quality-probability shortfall.
pub const QUALITY_PENALTY: f64 = 1_000_000.0;

pub const WEIGHT_YIELD: f64 = 0.35;
pub const WEIGHT_OUTPUT: f64 = 0.25;
pub const WEIGHT_ENERGY: f64 = 0.25;
pub const WEIGHT_SCRAP: f64 = 0.15;

/// Rough operating range of each objective term, used to bring them onto
/// a common scale before weighting.
pub const NORM_YIELD_PCT: f64 = 20.0;
pub const NORM_OUTPUT_TONS: f64 = 200.0;
pub const NORM_ENERGY_USD: f64 = 50_000.0;
pub const NORM_SCRAP_PCT: f64 = 10.0;
