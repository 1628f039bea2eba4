//! Recommendation pipeline output and its serialized report form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::variables::outcome;
use super::{AnomalyResult, OptimizationResult, Setpoints};

/// Predicted shift outcomes at the recommended setpoints.
///
/// `None` means the surrogate for that target was unavailable (or the
/// optimizer never ran).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictedOutcomes {
    pub yield_pct: Option<f64>,
    pub steel_output_tons: Option<f64>,
    pub energy_cost_usd: Option<f64>,
    pub production_cost_usd: Option<f64>,
    pub scrap_rate_pct: Option<f64>,
}

/// Full output of one recommendation request.
///
/// Always constructible: every stage that fails softly leaves its fields
/// at `None` and pushes a warning instead.
#[derive(Debug, Clone, Default)]
pub struct RecommendationResult {
    /// Anomaly check on the supplied context (None when skipped/unavailable)
    pub anomaly: Option<AnomalyResult>,
    /// Optimizer output (None when the optimizer could not run)
    pub optimization: Option<OptimizationResult>,
    /// Controllable variable → recommended value
    pub recommended_setpoints: Setpoints,
    /// Flattened outcome predictions
    pub predicted: PredictedOutcomes,
    /// P(quality_grade_pass = 1) at the recommended setpoints
    pub quality_pass_probability: Option<f64>,
    /// P(rework_required = 1) at the recommended setpoints
    pub rework_probability: Option<f64>,
    /// Human-readable warnings, in the order they were raised
    pub warnings: Vec<String>,
}

impl RecommendationResult {
    /// Copy an optimizer result into the flattened top-level fields.
    pub fn absorb_optimization(&mut self, opt: OptimizationResult) {
        let outcomes = &opt.predicted_outcomes;
        self.recommended_setpoints = opt.recommended_setpoints.clone();
        self.predicted = PredictedOutcomes {
            yield_pct: outcomes.get(outcome::YIELD_PCT).copied(),
            steel_output_tons: outcomes.get(outcome::STEEL_OUTPUT_TONS).copied(),
            energy_cost_usd: outcomes.get(outcome::ENERGY_COST_USD).copied(),
            production_cost_usd: outcomes.get(outcome::PRODUCTION_COST_USD).copied(),
            scrap_rate_pct: outcomes.get(outcome::SCRAP_RATE_PCT).copied(),
        };
        self.quality_pass_probability = Some(opt.quality_pass_prob);
        self.rework_probability = Some(opt.rework_prob);
        self.optimization = Some(opt);
    }

    /// Serializable report (the CLI / API response shape).
    pub fn to_report(&self) -> RecommendationReport {
        RecommendationReport {
            is_anomaly: self.anomaly.map(|a| a.is_anomaly),
            anomaly_score: self.anomaly.map(|a| a.anomaly_score),
            recommended_setpoints: self.recommended_setpoints.clone(),
            predicted_outcomes: self.predicted.clone(),
            quality_pass_probability: self.quality_pass_probability,
            rework_probability: self.rework_probability,
            warnings: self.warnings.clone(),
            generated_at: Utc::now(),
        }
    }
}

/// JSON shape emitted on stdout by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub is_anomaly: Option<bool>,
    pub anomaly_score: Option<f64>,
    pub recommended_setpoints: Setpoints,
    pub predicted_outcomes: PredictedOutcomes,
    pub quality_pass_probability: Option<f64>,
    pub rework_probability: Option<f64>,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:>10.precision$}"),
        None => format!("{:>10}", "n/a"),
    }
}

impl std::fmt::Display for RecommendationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(65);
        writeln!(f, "{rule}")?;
        writeln!(f, "  STEEL PLANT SHIFT OPTIMISATION RECOMMENDATION")?;
        writeln!(f, "{rule}")?;

        if let Some(anomaly) = &self.anomaly {
            let status = if anomaly.is_anomaly {
                "ANOMALOUS CONDITIONS"
            } else {
                "Normal operating conditions"
            };
            writeln!(f)?;
            writeln!(f, "Anomaly Check  : {status}")?;
            writeln!(f, "Anomaly Score  : {:.4}", anomaly.anomaly_score)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for w in &self.warnings {
                writeln!(f, "  ! {w}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Recommended Setpoints:")?;
        for (k, v) in &self.recommended_setpoints {
            writeln!(f, "  {k:<35}  {v:>10.3}")?;
        }

        let p = &self.predicted;
        writeln!(f)?;
        writeln!(f, "Predicted Outcomes:")?;
        writeln!(f, "  {:<35}  {}  %", "yield_pct", fmt_opt(p.yield_pct, 3))?;
        writeln!(f, "  {:<35}  {}  t", "steel_output_tons", fmt_opt(p.steel_output_tons, 3))?;
        writeln!(f, "  {:<35}  {}  USD", "energy_cost_usd", fmt_opt(p.energy_cost_usd, 2))?;
        writeln!(
            f,
            "  {:<35}  {}  USD",
            "production_cost_usd",
            fmt_opt(p.production_cost_usd, 2)
        )?;
        writeln!(f, "  {:<35}  {}  %", "scrap_rate_pct", fmt_opt(p.scrap_rate_pct, 3))?;
        writeln!(
            f,
            "  {:<35}  {}",
            "P(quality_grade_pass)",
            fmt_opt(self.quality_pass_probability, 4)
        )?;
        writeln!(
            f,
            "  {:<35}  {}",
            "P(rework_required)",
            fmt_opt(self.rework_probability, 4)
        )?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_optimization() -> OptimizationResult {
        let mut outcomes = BTreeMap::new();
        outcomes.insert("yield_pct".to_string(), 88.5);
        outcomes.insert("energy_cost_usd".to_string(), 31_000.0);
        let mut setpoints = BTreeMap::new();
        setpoints.insert("num_furnaces_running".to_string(), 3.0);
        OptimizationResult {
            recommended_setpoints: setpoints,
            predicted_outcomes: outcomes,
            quality_pass_prob: 0.91,
            rework_prob: 0.04,
            best_score: 1.2,
            n_trials: 50,
            best_trial: 17,
        }
    }

    #[test]
    fn test_absorb_flattens_known_outcomes_and_leaves_rest_unavailable() {
        let mut result = RecommendationResult::default();
        result.absorb_optimization(sample_optimization());

        assert_eq!(result.predicted.yield_pct, Some(88.5));
        assert_eq!(result.predicted.energy_cost_usd, Some(31_000.0));
        assert_eq!(result.predicted.steel_output_tons, None);
        assert_eq!(result.quality_pass_probability, Some(0.91));
        assert_eq!(result.recommended_setpoints.get("num_furnaces_running"), Some(&3.0));
        assert!(result.optimization.is_some());
    }

    #[test]
    fn test_report_serializes_missing_values_as_null() {
        let result = RecommendationResult::default();
        let json = serde_json::to_value(result.to_report()).unwrap();

        assert!(json["is_anomaly"].is_null());
        assert!(json["quality_pass_probability"].is_null());
        assert!(json["predicted_outcomes"]["yield_pct"].is_null());
        assert_eq!(json["warnings"], serde_json::json!([]));
    }

    #[test]
    fn test_summary_lists_warnings_and_marks_unavailable_numbers() {
        let result = RecommendationResult {
            warnings: vec!["models missing".to_string()],
            ..Default::default()
        };
        let text = result.to_string();
        assert!(text.contains("! models missing"));
        assert!(text.contains("n/a"));
    }
}
