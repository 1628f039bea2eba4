//! Optimization engine types for surrogate-driven setpoint search

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Uncontrollable shift conditions, keyed by variable name.
///
/// Unknown keys are ignored and missing keys are defaulted downstream.
pub type Context = HashMap<String, f64>;

/// Controllable variable name → value.
pub type Setpoints = BTreeMap<String, f64>;

/// Surrogate target name → predicted value.
pub type Outcomes = BTreeMap<String, f64>;

/// One evaluated point of the search.
///
/// `params` is aligned with the dimension order of the `SearchSpace` the
/// trial was proposed in. Infeasible trials carry a penalized score rather
/// than a separate flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationTrial {
    /// Zero-based trial index within the run
    pub number: usize,
    /// Proposed value per search dimension
    pub params: Vec<f64>,
    /// Composite (or penalty) score; higher is better
    pub score: f64,
}

/// Best-trial outcome of a complete optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Recommended setpoints, rounded per variable policy
    pub recommended_setpoints: Setpoints,
    /// Every regressor prediction at the recommended setpoints
    pub predicted_outcomes: Outcomes,
    /// P(quality_grade_pass = 1) at the recommended setpoints
    pub quality_pass_prob: f64,
    /// P(rework_required = 1) at the recommended setpoints
    pub rework_prob: f64,
    /// Winning composite score
    pub best_score: f64,
    /// Trial budget consumed
    pub n_trials: usize,
    /// Index of the winning trial
    pub best_trial: usize,
}

impl std::fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Optimization Result ===")?;
        writeln!(f)?;
        writeln!(f, "Recommended Setpoints:")?;
        for (k, v) in &self.recommended_setpoints {
            writeln!(f, "  {k:<30} {v:>10.3}")?;
        }
        writeln!(f)?;
        writeln!(f, "Predicted Outcomes:")?;
        for (k, v) in &self.predicted_outcomes {
            writeln!(f, "  {k:<30} {v:>10.3}")?;
        }
        writeln!(f)?;
        writeln!(f, "  {:<30} {:>10.4}", "quality_pass_prob", self.quality_pass_prob)?;
        writeln!(f, "  {:<30} {:>10.4}", "rework_prob", self.rework_prob)?;
        writeln!(f)?;
        writeln!(f, "  {:<30} {:>10.4}", "Composite score", self.best_score)?;
        write!(f, "  {:<30} {:>10}", "Trials run", self.n_trials)
    }
}
