//! Anomaly gate output

use serde::{Deserialize, Serialize};

/// Raw detector label for an outlier (detector convention).
pub const ANOMALY_LABEL: i8 = -1;

/// Raw detector label for an inlier.
pub const NORMAL_LABEL: i8 = 1;

/// Result of a single anomaly query against the learned operating envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    /// `anomaly_score < threshold`
    pub is_anomaly: bool,
    /// Decision score; lower is more anomalous
    pub anomaly_score: f64,
    /// Detector's own label: -1 (outlier) or 1 (inlier)
    pub label: i8,
}

impl std::fmt::Display for AnomalyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.is_anomaly { "ANOMALY" } else { "Normal" };
        write!(f, "AnomalyResult({status}, score={:.4})", self.anomaly_score)
    }
}
