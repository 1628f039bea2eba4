//! Anomaly gate
//!
//! Flags shift contexts that fall outside the learned normal operating
//! envelope. The threshold is the 5th percentile of decision scores on
//! known-good shifts, computed at training time; the gate only applies it.
//!
//! The gate is advisory. A missing detector bundle yields
//! [`Availability::Unavailable`] rather than an error, and the
//! orchestrator proceeds without it.

pub mod isolation_forest;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::features::{FeatureOrder, FeatureVectorAssembler};
use crate::surrogate::artifacts::{self, ArtifactError};
use crate::types::{Availability, AnomalyResult, Context, ANOMALY_LABEL, NORMAL_LABEL};

pub use isolation_forest::IsolationForest;

// ============================================================================
// Errors and scorer contract
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AnomalyError {
    #[error("detector expects {expected} features, row has {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("split references feature {index}, row has {len}")]
    FeatureIndexOutOfRange { index: usize, len: usize },

    #[error("malformed isolation tree at node {node}: {reason}")]
    MalformedTree { node: usize, reason: &'static str },

    #[error("detector produced non-finite score {0}")]
    NonFinite(f64),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Trained outlier detector: lower decision scores are more anomalous.
pub trait OutlierScorer: Send + Sync {
    /// Decision score for one row laid out in the detector's feature order.
    fn decision(&self, row: &[f64]) -> Result<f64, AnomalyError>;

    /// Detector's own label: `-1` when the decision score is negative.
    fn label(&self, row: &[f64]) -> Result<i8, AnomalyError> {
        Ok(label_for(self.decision(row)?))
    }
}

/// Detector label for an already computed decision score.
pub fn label_for(decision: f64) -> i8 {
    if decision < 0.0 {
        ANOMALY_LABEL
    } else {
        NORMAL_LABEL
    }
}

/// Persisted detector bundle (`anomaly_iforest.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyBundle {
    pub model: IsolationForest,
    pub threshold: f64,
    pub feature_cols: FeatureOrder,
}

// ============================================================================
// Gate
// ============================================================================

pub struct AnomalyGate {
    scorer: Box<dyn OutlierScorer>,
    threshold: f64,
    feature_order: FeatureOrder,
}

impl std::fmt::Debug for AnomalyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyGate")
            .field("threshold", &self.threshold)
            .field("features", &self.feature_order.len())
            .finish()
    }
}

impl AnomalyGate {
    pub fn new(
        scorer: impl OutlierScorer + 'static,
        threshold: f64,
        feature_order: FeatureOrder,
    ) -> Self {
        Self {
            scorer: Box::new(scorer),
            threshold,
            feature_order,
        }
    }

    /// Load the detector bundle from `dir`.
    ///
    /// Any failure (absent, unparseable, structurally invalid) leaves the
    /// gate unavailable with the cause attached.
    pub fn from_artifact(dir: &Path) -> Availability<Self> {
        let path = dir.join(artifacts::ANOMALY_BUNDLE_FILE);
        let bundle: AnomalyBundle = match artifacts::read_json(&path) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Anomaly detector unavailable");
                return Availability::unavailable(e.to_string());
            }
        };
        if let Err(reason) = bundle.model.validate() {
            let e = ArtifactError::Invalid { path, reason };
            warn!(error = %e, "Anomaly detector unavailable");
            return Availability::unavailable(e.to_string());
        }
        if !bundle.threshold.is_finite() {
            warn!(threshold = bundle.threshold, "Anomaly threshold is not finite");
            return Availability::unavailable(format!(
                "non-finite anomaly threshold in {}",
                path.display()
            ));
        }

        info!(
            threshold = bundle.threshold,
            trees = bundle.model.trees.len(),
            features = bundle.feature_cols.len(),
            "Loaded anomaly detector"
        );
        Availability::Loaded(Self::new(bundle.model, bundle.threshold, bundle.feature_cols))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn feature_order(&self) -> &FeatureOrder {
        &self.feature_order
    }

    /// Classify a context map; missing columns are filled with `0.0`.
    pub fn predict(&self, context: &Context) -> Result<AnomalyResult, AnomalyError> {
        let row = FeatureVectorAssembler::assemble_row(&self.feature_order, context);
        self.predict_vector(&row)
    }

    /// Classify a row already laid out in the detector's feature order.
    pub fn predict_vector(&self, row: &[f64]) -> Result<AnomalyResult, AnomalyError> {
        if row.len() != self.feature_order.len() {
            return Err(AnomalyError::FeatureCountMismatch {
                expected: self.feature_order.len(),
                actual: row.len(),
            });
        }
        let score = self.scorer.decision(row)?;
        if !score.is_finite() {
            return Err(AnomalyError::NonFinite(score));
        }
        Ok(AnomalyResult {
            // strict: a score equal to the threshold is normal
            is_anomaly: score < self.threshold,
            anomaly_score: score,
            label: label_for(score),
        })
    }

    /// Row-wise [`predict`](Self::predict).
    pub fn predict_batch(&self, rows: &[Context]) -> Result<Vec<AnomalyResult>, AnomalyError> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Scores every row with its first column.
    struct FirstColumn;

    impl OutlierScorer for FirstColumn {
        fn decision(&self, row: &[f64]) -> Result<f64, AnomalyError> {
            Ok(row[0])
        }
    }

    fn gate(threshold: f64) -> AnomalyGate {
        AnomalyGate::new(
            FirstColumn,
            threshold,
            ["score", "other"].into_iter().collect(),
        )
    }

    fn ctx(score: f64) -> Context {
        [("score".to_string(), score)].into_iter().collect()
    }

    #[test]
    fn test_score_equal_to_threshold_is_normal() {
        let result = gate(-0.05).predict(&ctx(-0.05)).unwrap();
        assert!(!result.is_anomaly);
        assert_eq!(result.anomaly_score, -0.05);
    }

    #[test]
    fn test_score_below_threshold_is_anomalous() {
        let result = gate(-0.05).predict(&ctx(-0.0500001)).unwrap();
        assert!(result.is_anomaly);
        assert_eq!(result.label, ANOMALY_LABEL);
    }

    #[test]
    fn test_threshold_and_label_are_independent() {
        // Above a negative threshold but below zero: normal per gate,
        // outlier per the detector's own label.
        let result = gate(-0.1).predict(&ctx(-0.02)).unwrap();
        assert!(!result.is_anomaly);
        assert_eq!(result.label, ANOMALY_LABEL);
    }

    #[test]
    fn test_batch_applies_same_rule_row_wise() {
        let rows = vec![ctx(0.2), ctx(-0.3), ctx(-0.1)];
        let results = gate(-0.1).predict_batch(&rows).unwrap();
        let flags: Vec<bool> = results.iter().map(|r| r.is_anomaly).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_wrong_width_vector_is_rejected() {
        let err = gate(0.0).predict_vector(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            AnomalyError::FeatureCountMismatch { expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_missing_bundle_is_unavailable_not_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let gate = AnomalyGate::from_artifact(tmp.path());
        assert!(!gate.is_loaded());
        assert!(gate.reason().unwrap().contains("anomaly_iforest.json"));
    }

    #[test]
    fn test_bundle_loads_from_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let bundle = json!({
            "model": {
                "max_samples": 2,
                "offset": -0.5,
                "trees": [ { "nodes": [
                    { "type": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 2 },
                    { "type": "leaf", "n_samples": 1 },
                    { "type": "leaf", "n_samples": 1 }
                ] } ]
            },
            "threshold": -0.25,
            "feature_cols": ["ambient_temp_c"]
        });
        std::fs::write(tmp.path().join("anomaly_iforest.json"), bundle.to_string()).unwrap();

        let gate = AnomalyGate::from_artifact(tmp.path());
        let gate = gate.as_loaded().unwrap();
        let result = gate.predict(&Context::new()).unwrap();
        assert!(!result.is_anomaly);
        assert_eq!(result.label, NORMAL_LABEL);
        assert!(result.anomaly_score.abs() < 1e-12);
    }

    #[test]
    fn test_predict_scores_each_row_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct Counting(Arc<AtomicUsize>);

        impl OutlierScorer for Counting {
            fn decision(&self, _row: &[f64]) -> Result<f64, AnomalyError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(-0.3)
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let gate = AnomalyGate::new(
            Counting(Arc::clone(&calls)),
            -0.1,
            ["score"].into_iter().collect(),
        );
        let result = gate.predict(&Context::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_anomaly);
        assert_eq!(result.label, ANOMALY_LABEL);
    }

    #[test]
    fn test_unvalidated_forest_reports_error_instead_of_panicking() {
        let forest = IsolationForest {
            max_samples: 2,
            offset: -0.5,
            trees: vec![isolation_forest::IsolationTree { nodes: vec![] }],
        };
        let gate = AnomalyGate::new(forest, -0.1, ["score"].into_iter().collect());
        assert!(matches!(
            gate.predict(&Context::new()),
            Err(AnomalyError::MalformedTree { .. })
        ));
    }
}
