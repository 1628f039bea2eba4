//! Serialized surrogate model formats and their inference.
//!
//! Regressors are either linear models or gradient-boosted tree ensembles;
//! classifiers wrap a raw-score regressor with a logistic link. Documents are
//! written by the training pipeline as tagged JSON:
//!
//! ```json
//! { "kind": "tree_ensemble", "base_score": 82.1,
//!   "trees": [ { "nodes": [
//!       { "type": "split", "feature": 0, "threshold": 1550.0, "left": 1, "right": 2 },
//!       { "type": "leaf", "value": -1.2 },
//!       { "type": "leaf", "value": 0.8 } ] } ] }
//! ```

use serde::{Deserialize, Serialize};

use super::{ProbabilityPredictor, ScalarPredictor, SurrogateError};

// ============================================================================
// Linear
// ============================================================================

/// `intercept + Σ coefficients[i] · x[i]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn raw(&self, x: &[f64]) -> Result<f64, SurrogateError> {
        if self.coefficients.len() != x.len() {
            return Err(SurrogateError::FeatureCountMismatch {
                expected: self.coefficients.len(),
                actual: x.len(),
            });
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum::<f64>())
    }
}

// ============================================================================
// Tree ensemble
// ============================================================================

/// One node of a regression tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` descends left; NaN follows `default_left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_true")]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Children must sit after their parent, which rules out cycles and
    /// guarantees every descent terminates.
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, threshold, .. } = node {
                for &child in [left, right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {i} has invalid child index {child}"));
                    }
                }
                if threshold.is_nan() {
                    return Err(format!("node {i} has NaN threshold"));
                }
            }
        }
        Ok(())
    }

    /// In-memory trees may be unvalidated: every index is checked and the
    /// walk visits at most `nodes.len()` nodes.
    fn leaf_value(&self, x: &[f64]) -> Result<f64, SurrogateError> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(idx).ok_or(SurrogateError::MalformedTree {
                node: idx,
                reason: "child index out of range",
            })?;
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let v = *x.get(*feature).ok_or(SurrogateError::FeatureIndexOutOfRange {
                        index: *feature,
                        len: x.len(),
                    })?;
                    let go_left = if v.is_nan() { *default_left } else { v <= *threshold };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
        Err(SurrogateError::MalformedTree {
            node: idx,
            reason: if self.nodes.is_empty() {
                "tree has no nodes"
            } else {
                "descent does not reach a leaf"
            },
        })
    }
}

/// Additive ensemble: `base_score + Σ tree(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

impl TreeEnsemble {
    fn raw(&self, x: &[f64]) -> Result<f64, SurrogateError> {
        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.leaf_value(x)?;
        }
        Ok(total)
    }
}

// ============================================================================
// Public artifact documents
// ============================================================================

/// Regressor document (`<target>_lgbm.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl RegressorArtifact {
    /// Structural checks run once at load time.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Linear(m) => {
                if m.coefficients.iter().any(|c| !c.is_finite()) || !m.intercept.is_finite() {
                    return Err("linear model has non-finite parameters".to_string());
                }
                Ok(())
            }
            Self::TreeEnsemble(e) => {
                for (t, tree) in e.trees.iter().enumerate() {
                    tree.validate().map_err(|reason| format!("tree {t}: {reason}"))?;
                }
                Ok(())
            }
        }
    }

    fn raw(&self, x: &[f64]) -> Result<f64, SurrogateError> {
        match self {
            Self::Linear(m) => m.raw(x),
            Self::TreeEnsemble(e) => e.raw(x),
        }
    }
}

impl ScalarPredictor for RegressorArtifact {
    fn predict(&self, features: &[f64]) -> Result<f64, SurrogateError> {
        let y = self.raw(features)?;
        if y.is_finite() {
            Ok(y)
        } else {
            Err(SurrogateError::NonFinite(y))
        }
    }
}

/// Classifier document (`<target>_catboost.json`): logistic link over a
/// raw-score model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub raw_score: RegressorArtifact,
}

impl ClassifierArtifact {
    pub fn validate(&self) -> Result<(), String> {
        self.raw_score.validate()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ProbabilityPredictor for ClassifierArtifact {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, SurrogateError> {
        let z = self.raw_score.raw(features)?;
        if z.is_nan() {
            return Err(SurrogateError::NonFinite(z));
        }
        Ok(sigmoid(z))
    }
}
