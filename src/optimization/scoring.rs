//! Composite objective and quality constraint

use crate::config::ObjectiveConfig;
use crate::types::variables::outcome;
use crate::types::Outcomes;

/// Scalarized objective for one evaluated trial; higher is better.
///
/// Below the quality threshold the weighted objective is replaced by a
/// steep penalty proportional to the shortfall, so near-feasible trials
/// still outrank far-infeasible ones. Missing outcomes count as `0.0`.
pub fn composite_score(
    objective: &ObjectiveConfig,
    outcomes: &Outcomes,
    quality_pass_prob: f64,
) -> f64 {
    if quality_pass_prob < objective.quality_pass_threshold {
        return -objective.quality_penalty * (objective.quality_pass_threshold - quality_pass_prob);
    }

    let value = |key: &str| outcomes.get(key).copied().unwrap_or(0.0);
    let w = &objective.weights;
    let n = &objective.normalization;

    w.yield_pct * value(outcome::YIELD_PCT) / n.yield_pct
        + w.steel_output_tons * value(outcome::STEEL_OUTPUT_TONS) / n.steel_output_tons
        - w.energy_cost_usd * value(outcome::ENERGY_COST_USD) / n.energy_cost_usd
        - w.scrap_rate_pct * value(outcome::SCRAP_RATE_PCT) / n.scrap_rate_pct
}
