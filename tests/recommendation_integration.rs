//! End-to-end recommendation tests against on-disk artifact directories.
//!
//! Each test writes a small but complete set of JSON artifacts into a
//! temporary directory and drives the public API the CLI uses.

use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

use setpoint_advisor::types::variables::{CONTROLLABLE_VARS, FURNACE_COUNT_VAR};
use setpoint_advisor::{
    parse_context, run_optimization, AdvisorConfig, OptimizationError, RecommendOptions,
    RecommendationOrchestrator, RegistryError,
};

// ============================================================================
// Fixtures
// ============================================================================

const CONTEXT_COLS: [&str; 3] = [
    "ambient_temperature_c",
    "humidity_pct",
    "raw_material_quality_index",
];

fn feature_cols() -> Vec<&'static str> {
    CONTROLLABLE_VARS.iter().copied().chain(CONTEXT_COLS).collect()
}

fn write(dir: &Path, name: &str, doc: &Value) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(doc).unwrap()).unwrap();
}

/// Linear document with the given (column, slope) terms.
fn linear(intercept: f64, terms: &[(&str, f64)]) -> Value {
    let cols = feature_cols();
    let coefficients: Vec<f64> = cols
        .iter()
        .map(|c| terms.iter().find(|(t, _)| t == c).map_or(0.0, |(_, w)| *w))
        .collect();
    json!({ "kind": "linear", "intercept": intercept, "coefficients": coefficients })
}

fn write_surrogates(dir: &Path) {
    write(dir, "feature_cols.json", &json!(feature_cols()));

    // Yield climbs with furnace temperature up to a split, then flattens
    write(
        dir,
        "yield_pct_lgbm.json",
        &json!({
            "kind": "tree_ensemble",
            "base_score": 80.0,
            "trees": [
                { "nodes": [
                    { "type": "split", "feature": 0, "threshold": 1550.0, "left": 1, "right": 2 },
                    { "type": "leaf", "value": -4.0 },
                    { "type": "leaf", "value": 6.0 }
                ] },
                { "nodes": [
                    { "type": "split", "feature": 3, "threshold": 35.0, "left": 1, "right": 2 },
                    { "type": "leaf", "value": 1.0 },
                    { "type": "leaf", "value": -1.0 }
                ] }
            ]
        }),
    );
    write(
        dir,
        "steel_output_tons_lgbm.json",
        &linear(20.0, &[("charge_weight_tons", 0.6), ("planned_runtime_hours", 2.0)]),
    );
    write(
        dir,
        "energy_cost_usd_lgbm.json",
        &linear(
            5_000.0,
            &[("avg_furnace_temperature_c", 10.0), (FURNACE_COUNT_VAR, 1_500.0)],
        ),
    );
    write(
        dir,
        "production_cost_usd_lgbm.json",
        &linear(100_000.0, &[("labor_count", 800.0)]),
    );
    write(dir, "scrap_rate_pct_lgbm.json", &linear(2.0, &[("scrap_ratio_pct", 0.05)]));

    // Quality falls as raw material quality drops
    write(
        dir,
        "quality_grade_pass_catboost.json",
        &json!({ "raw_score": linear(-2.0, &[("raw_material_quality_index", 6.0)]) }),
    );
    write(
        dir,
        "rework_required_catboost.json",
        &json!({ "raw_score": linear(-3.0, &[]) }),
    );
}

/// Detector over the context columns: short paths above 40 °C ambient.
fn write_anomaly_bundle(dir: &Path) {
    write(
        dir,
        "anomaly_iforest.json",
        &json!({
            "model": {
                "max_samples": 256,
                "offset": -0.5,
                "trees": [ { "nodes": [
                    { "type": "split", "feature": 0, "threshold": 40.0, "left": 1, "right": 2 },
                    { "type": "leaf", "n_samples": 200 },
                    { "type": "leaf", "n_samples": 1 }
                ] } ]
            },
            "threshold": -0.05,
            "feature_cols": CONTEXT_COLS
        }),
    );
}

fn full_artifacts() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_surrogates(tmp.path());
    write_anomaly_bundle(tmp.path());
    tmp
}

fn quick_config() -> AdvisorConfig {
    let mut config = AdvisorConfig::default();
    config.optimizer.n_trials = 60;
    config.optimizer.n_startup_trials = 20;
    config
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn full_artifacts_produce_complete_recommendation() {
    let tmp = full_artifacts();
    let config = quick_config();
    let orch = RecommendationOrchestrator::from_artifacts(tmp.path(), &config);
    assert!(orch.gate().is_loaded());
    assert!(orch.optimizer().is_loaded());

    let ctx = parse_context(
        r#"{"ambient_temperature_c": 24.0, "humidity_pct": 55.0, "raw_material_quality_index": 0.9}"#,
    )
    .unwrap();
    let result = orch.recommend(&ctx, RecommendOptions::new(60)).unwrap();

    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.anomaly.map(|a| a.is_anomaly), Some(false));
    assert_eq!(result.recommended_setpoints.len(), CONTROLLABLE_VARS.len());
    assert!(result.predicted.yield_pct.is_some());
    assert!(result.predicted.production_cost_usd.is_some());
    assert!(result.quality_pass_probability.unwrap() > 0.95);

    let report = serde_json::to_value(result.to_report()).unwrap();
    for key in [
        "is_anomaly",
        "anomaly_score",
        "recommended_setpoints",
        "predicted_outcomes",
        "quality_pass_probability",
        "rework_probability",
        "warnings",
        "generated_at",
    ] {
        assert!(report.get(key).is_some(), "report is missing {key}");
    }
}

#[test]
fn missing_optimizer_artifacts_yield_single_warning() {
    let tmp = TempDir::new().unwrap();
    let orch = RecommendationOrchestrator::from_artifacts(tmp.path(), &quick_config());

    let options = RecommendOptions::new(60).skip_anomaly_check(true);
    let result = orch.recommend(&Default::default(), options).unwrap();

    assert!(result.optimization.is_none());
    assert!(result.predicted.yield_pct.is_none());
    assert!(result.predicted.scrap_rate_pct.is_none());
    assert!(result.quality_pass_probability.is_none());
    assert_eq!(result.warnings.len(), 1, "{:?}", result.warnings);
    assert!(result.warnings[0].contains("feature_cols.json"));

    let report = serde_json::to_value(result.to_report()).unwrap();
    assert_eq!(report["predicted_outcomes"]["yield_pct"], Value::Null);
    assert_eq!(report["is_anomaly"], Value::Null);
}

#[test]
fn hot_ambient_is_flagged_but_still_optimized() {
    let tmp = full_artifacts();
    let orch = RecommendationOrchestrator::from_artifacts(tmp.path(), &quick_config());
    let ctx = parse_context(r#"{"ambient_temperature_c": 47.0, "raw_material_quality_index": 0.9}"#)
        .unwrap();

    let result = orch.recommend(&ctx, RecommendOptions::new(30)).unwrap();

    let anomaly = result.anomaly.unwrap();
    assert!(anomaly.is_anomaly);
    assert!(anomaly.anomaly_score < -0.05);
    assert!(result.warnings.iter().any(|w| w.contains("anomalous")));
    assert!(result.optimization.is_some());
}

#[test]
fn poor_material_triggers_quality_advisory() {
    let tmp = full_artifacts();
    let orch = RecommendationOrchestrator::from_artifacts(tmp.path(), &quick_config());
    // raw score = -2 + 6 * 0.1 = -1.4 for every setpoint
    let ctx = parse_context(r#"{"ambient_temperature_c": 20.0, "raw_material_quality_index": 0.1}"#)
        .unwrap();

    let result = orch.recommend(&ctx, RecommendOptions::new(30)).unwrap();

    assert!(result.quality_pass_probability.unwrap() < 0.85);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.starts_with("Quality pass probability")));
    assert!(result.optimization.unwrap().best_score < 0.0);
}

#[test]
fn missing_classifiers_fall_back_and_are_reported() {
    let tmp = full_artifacts();
    std::fs::remove_file(tmp.path().join("quality_grade_pass_catboost.json")).unwrap();
    std::fs::remove_file(tmp.path().join("rework_required_catboost.json")).unwrap();

    let orch = RecommendationOrchestrator::from_artifacts(tmp.path(), &quick_config());
    let options = RecommendOptions::new(20).skip_anomaly_check(true);
    let result = orch.recommend(&Default::default(), options).unwrap();

    assert_eq!(result.quality_pass_probability, Some(1.0));
    assert_eq!(result.rework_probability, Some(0.0));
    assert_eq!(result.warnings.len(), 2, "{:?}", result.warnings);
}

#[test]
fn broken_anomaly_bundle_only_disables_the_gate() {
    let tmp = full_artifacts();
    std::fs::write(tmp.path().join("anomaly_iforest.json"), "{\"model\": 3}").unwrap();

    let orch = RecommendationOrchestrator::from_artifacts(tmp.path(), &quick_config());
    assert!(!orch.gate().is_loaded());

    let result = orch.recommend(&Default::default(), RecommendOptions::new(10)).unwrap();
    assert!(result.anomaly.is_none());
    assert!(result.optimization.is_some());
    assert!(result.warnings[0].starts_with("Anomaly detector unavailable"));
}

#[test]
fn run_optimization_is_repeatable() {
    let tmp = full_artifacts();
    let config = quick_config();
    let ctx = parse_context(r#"{"raw_material_quality_index": 0.8}"#).unwrap();

    let a = run_optimization(&ctx, tmp.path(), 40, &config).unwrap();
    let b = run_optimization(&ctx, tmp.path(), 40, &config).unwrap();
    assert_eq!(a.recommended_setpoints, b.recommended_setpoints);
    assert_eq!(a.best_trial, b.best_trial);
}

#[test]
fn different_seed_explores_differently() {
    let tmp = full_artifacts();
    let ctx = parse_context(r#"{"raw_material_quality_index": 0.8}"#).unwrap();
    let mut other = quick_config();
    other.optimizer.seed = 1234;

    let a = run_optimization(&ctx, tmp.path(), 40, &quick_config()).unwrap();
    let b = run_optimization(&ctx, tmp.path(), 40, &other).unwrap();
    assert_ne!(a.recommended_setpoints, b.recommended_setpoints);
}

#[test]
fn mismatched_regressor_width_aborts_the_run() {
    let tmp = full_artifacts();
    write(
        tmp.path(),
        "scrap_rate_pct_lgbm.json",
        &json!({ "kind": "linear", "intercept": 1.0, "coefficients": [0.1, 0.2] }),
    );
    let orch = RecommendationOrchestrator::from_artifacts(tmp.path(), &quick_config());
    let options = RecommendOptions::new(10).skip_anomaly_check(true);

    let err = orch.recommend(&Default::default(), options).unwrap_err();
    assert!(matches!(err, OptimizationError::Inference { trial: 0, .. }));
}

#[test]
fn run_optimization_without_feature_order_is_config_missing() {
    let tmp = TempDir::new().unwrap();
    let err = run_optimization(&Default::default(), tmp.path(), 10, &quick_config()).unwrap_err();
    assert!(matches!(err, OptimizationError::Registry(RegistryError::ConfigMissing(_))));
}
