//! Recommendation orchestrator
//!
//! Sequences the anomaly gate, the setpoint optimizer and result
//! aggregation for one shift context. Optional artifacts that are missing
//! become warnings on the result; only mid-run inference failures escape.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::anomaly::AnomalyGate;
use crate::config::AdvisorConfig;
use crate::optimization::{OptimizationError, SetpointOptimizer};
use crate::types::variables::{CONTEXT_VARS, CONTROLLABLE_VARS};
use crate::types::{Availability, Context, RecommendationResult};

// ============================================================================
// Input
// ============================================================================

/// Malformed request context. Raised before any artifact is touched.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("context is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("context must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("context field '{key}' is not a number")]
    NonNumeric { key: String },
}

/// Parse a JSON object of numeric fields into a [`Context`].
///
/// `null` fields are dropped (treated as missing); any other non-number
/// is rejected.
pub fn parse_context(raw: &str) -> Result<Context, InputError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let fields = match value {
        serde_json::Value::Object(fields) => fields,
        other => return Err(InputError::NotAnObject(json_kind(&other))),
    };

    let mut context = Context::with_capacity(fields.len());
    for (key, v) in fields {
        match v {
            serde_json::Value::Null => {}
            serde_json::Value::Number(n) => {
                let x = n.as_f64().ok_or_else(|| InputError::NonNumeric { key: key.clone() })?;
                let known = CONTEXT_VARS.contains(&key.as_str())
                    || CONTROLLABLE_VARS.contains(&key.as_str());
                if !known {
                    debug!(key = %key, "Context field is not a raw shift variable");
                }
                context.insert(key, x);
            }
            _ => return Err(InputError::NonNumeric { key }),
        }
    }
    Ok(context)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Per-request knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendOptions {
    pub n_trials: usize,
    pub skip_anomaly_check: bool,
}

impl RecommendOptions {
    pub fn new(n_trials: usize) -> Self {
        Self {
            n_trials,
            skip_anomaly_check: false,
        }
    }

    pub fn skip_anomaly_check(mut self, skip: bool) -> Self {
        self.skip_anomaly_check = skip;
        self
    }
}

#[derive(Debug)]
pub struct RecommendationOrchestrator {
    gate: Availability<AnomalyGate>,
    optimizer: Availability<SetpointOptimizer>,
    quality_pass_threshold: f64,
}

impl RecommendationOrchestrator {
    pub fn new(
        gate: Availability<AnomalyGate>,
        optimizer: Availability<SetpointOptimizer>,
        config: &AdvisorConfig,
    ) -> Self {
        Self {
            gate,
            optimizer,
            quality_pass_threshold: config.objective.quality_pass_threshold,
        }
    }

    /// Load the gate and the optimizer from `dir`. Never fails: whatever
    /// cannot be loaded is recorded as unavailable.
    pub fn from_artifacts(dir: &Path, config: &AdvisorConfig) -> Self {
        let gate = AnomalyGate::from_artifact(dir);
        let optimizer = match SetpointOptimizer::from_artifacts(dir, config) {
            Ok(optimizer) => Availability::Loaded(optimizer),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Optimizer unavailable");
                Availability::unavailable(e.to_string())
            }
        };
        info!(
            dir = %dir.display(),
            anomaly_gate = gate.is_loaded(),
            optimizer = optimizer.is_loaded(),
            "Recommendation pipeline ready"
        );
        Self::new(gate, optimizer, config)
    }

    pub fn gate(&self) -> &Availability<AnomalyGate> {
        &self.gate
    }

    pub fn optimizer(&self) -> &Availability<SetpointOptimizer> {
        &self.optimizer
    }

    /// Produce a recommendation for `context`.
    ///
    /// Returns `Err` only when a surrogate fails during the search.
    pub fn recommend(
        &self,
        context: &Context,
        options: RecommendOptions,
    ) -> Result<RecommendationResult, OptimizationError> {
        let mut result = RecommendationResult::default();

        // 1. Anomaly gate (advisory)
        if !options.skip_anomaly_check {
            self.check_anomaly(context, &mut result);
        }

        // 2. Optimizer
        match &self.optimizer {
            Availability::Loaded(optimizer) => {
                for missing in optimizer.registry().missing_models() {
                    result.warnings.push(format!("Surrogate model unavailable: {missing}."));
                }
                let opt = optimizer.optimize(context, options.n_trials)?;
                // 3. Flatten
                result.absorb_optimization(opt);
            }
            Availability::Unavailable { reason } => {
                result.warnings.push(format!(
                    "Optimisation models not found: {reason}. Run the training pipeline first."
                ));
            }
        }

        // 4. Final quality advisory
        if let Some(q) = result.quality_pass_probability {
            if q < self.quality_pass_threshold {
                let msg = format!(
                    "Quality pass probability ({:.2}%) is below the {:.0}% threshold. \
                     Review material quality and process settings.",
                    q * 100.0,
                    self.quality_pass_threshold * 100.0
                );
                warn!("{msg}");
                result.warnings.push(msg);
            }
        }

        Ok(result)
    }

    fn check_anomaly(&self, context: &Context, result: &mut RecommendationResult) {
        match &self.gate {
            Availability::Loaded(gate) => match gate.predict(context) {
                Ok(anomaly) => {
                    if anomaly.is_anomaly {
                        let msg = format!(
                            "Current operating conditions are anomalous (score={:.4}). \
                             Optimisation recommendations may be unreliable.",
                            anomaly.anomaly_score
                        );
                        warn!("{msg}");
                        result.warnings.push(msg);
                    }
                    result.anomaly = Some(anomaly);
                }
                Err(e) => {
                    warn!(error = %e, "Anomaly check failed");
                    result.warnings.push(format!("Anomaly check failed: {e}."));
                }
            },
            Availability::Unavailable { reason } => {
                result
                    .warnings
                    .push(format!("Anomaly detector unavailable: {reason}."));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AnomalyError, OutlierScorer};
    use crate::features::FeatureOrder;
    use crate::surrogate::models::LinearModel;
    use crate::surrogate::{ClassifierArtifact, RegressorArtifact, SurrogateModelRegistry};
    use crate::types::variables::CONTROLLABLE_VARS;

    struct Constant(f64);

    impl OutlierScorer for Constant {
        fn decision(&self, _row: &[f64]) -> Result<f64, AnomalyError> {
            Ok(self.0)
        }
    }

    fn order() -> FeatureOrder {
        CONTROLLABLE_VARS.into_iter().collect()
    }

    fn constant(value: f64) -> RegressorArtifact {
        RegressorArtifact::Linear(LinearModel {
            intercept: value,
            coefficients: vec![0.0; CONTROLLABLE_VARS.len()],
        })
    }

    fn optimizer(quality_raw: f64) -> SetpointOptimizer {
        let registry = SurrogateModelRegistry::new(order())
            .with_regressor("yield_pct", constant(88.0))
            .with_regressor("steel_output_tons", constant(140.0))
            .with_regressor("energy_cost_usd", constant(32_000.0))
            .with_regressor("production_cost_usd", constant(250_000.0))
            .with_regressor("scrap_rate_pct", constant(4.0))
            .with_quality_classifier(ClassifierArtifact {
                raw_score: constant(quality_raw),
            })
            .with_rework_classifier(ClassifierArtifact {
                raw_score: constant(-3.0),
            });
        SetpointOptimizer::new(registry, &AdvisorConfig::default())
    }

    fn gate(score: f64) -> Availability<AnomalyGate> {
        Availability::Loaded(AnomalyGate::new(Constant(score), -0.05, order()))
    }

    #[test]
    fn test_context_parses_numbers_and_drops_nulls() {
        let ctx = parse_context(r#"{"ambient_temperature_c": 28.5, "humidity_pct": null, "grade_change_flag": 1}"#)
            .unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx["grade_change_flag"], 1.0);
    }

    #[test]
    fn test_malformed_context_is_rejected() {
        assert!(matches!(parse_context("{oops"), Err(InputError::Json(_))));
        assert!(matches!(parse_context("[1, 2]"), Err(InputError::NotAnObject("an array"))));
        match parse_context(r#"{"product_grade": "A36"}"#) {
            Err(InputError::NonNumeric { key }) => assert_eq!(key, "product_grade"),
            other => panic!("expected NonNumeric, got {other:?}"),
        }
    }

    #[test]
    fn test_healthy_run_has_no_warnings() {
        let orch = RecommendationOrchestrator::new(
            gate(0.1),
            Availability::Loaded(optimizer(4.0)),
            &AdvisorConfig::default(),
        );
        let result = orch.recommend(&Context::new(), RecommendOptions::new(20)).unwrap();

        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.anomaly.map(|a| a.is_anomaly), Some(false));
        assert_eq!(result.predicted.yield_pct, Some(88.0));
        assert_eq!(result.predicted.production_cost_usd, Some(250_000.0));
        assert_eq!(result.recommended_setpoints.len(), 10);
        assert!(result.optimization.is_some());
    }

    #[test]
    fn test_anomalous_context_warns_but_still_optimizes() {
        let orch = RecommendationOrchestrator::new(
            gate(-0.2),
            Availability::Loaded(optimizer(4.0)),
            &AdvisorConfig::default(),
        );
        let result = orch.recommend(&Context::new(), RecommendOptions::new(10)).unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("anomalous"));
        assert!(result.optimization.is_some());
    }

    #[test]
    fn test_low_quality_probability_adds_advisory() {
        // sigmoid(0) = 0.5
        let orch = RecommendationOrchestrator::new(
            Availability::unavailable("not loaded"),
            Availability::Loaded(optimizer(0.0)),
            &AdvisorConfig::default(),
        );
        let options = RecommendOptions::new(10).skip_anomaly_check(true);
        let result = orch.recommend(&Context::new(), options).unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Quality pass probability (50.00%)"));
        assert!(result.warnings[0].contains("85% threshold"));
    }

    #[test]
    fn test_missing_optimizer_degrades_to_single_warning() {
        let orch = RecommendationOrchestrator::new(
            Availability::unavailable("not loaded"),
            Availability::unavailable("feature order unavailable"),
            &AdvisorConfig::default(),
        );
        let options = RecommendOptions::new(10).skip_anomaly_check(true);
        let result = orch.recommend(&Context::new(), options).unwrap();

        assert!(result.optimization.is_none());
        assert_eq!(result.predicted, Default::default());
        assert!(result.quality_pass_probability.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Optimisation models not found"));
    }

    #[test]
    fn test_unavailable_gate_is_reported_when_not_skipped() {
        let orch = RecommendationOrchestrator::new(
            Availability::unavailable("anomaly_iforest.json missing"),
            Availability::Loaded(optimizer(4.0)),
            &AdvisorConfig::default(),
        );
        let result = orch.recommend(&Context::new(), RecommendOptions::new(5)).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Anomaly detector unavailable"));
        assert!(result.anomaly.is_none());
    }

    #[test]
    fn test_inference_error_escapes() {
        let registry = SurrogateModelRegistry::new(order())
            .with_regressor("yield_pct", RegressorArtifact::Linear(LinearModel {
                intercept: 0.0,
                coefficients: vec![1.0],
            }));
        let orch = RecommendationOrchestrator::new(
            Availability::unavailable("not loaded"),
            Availability::Loaded(SetpointOptimizer::new(registry, &AdvisorConfig::default())),
            &AdvisorConfig::default(),
        );
        let options = RecommendOptions::new(5).skip_anomaly_check(true);
        assert!(orch.recommend(&Context::new(), options).is_err());
    }
}
