//! Isolation forest inference
//!
//! Mirrors the decision function of a trained isolation forest: the shorter
//! the average path needed to isolate a row, the more anomalous it is.

use serde::{Deserialize, Serialize};

use super::{AnomalyError, OutlierScorer};

const EULER_GAMMA: f64 = 0.577_215_664_9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IsolationNode {
    /// `x[feature] <= threshold` descends left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node; `n_samples` training rows ended here.
    Leaf { n_samples: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    pub nodes: Vec<IsolationNode>,
}

impl IsolationTree {
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let IsolationNode::Split { left, right, threshold, .. } = node {
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

    /// Leaf depth plus the expected remaining path for the leaf's population.
    fn path_length(&self, x: &[f64]) -> Result<f64, AnomalyError> {
        let mut idx = 0;
        let mut depth = 0usize;
        while depth < self.nodes.len() {
            let node = self.nodes.get(idx).ok_or(AnomalyError::MalformedTree {
                node: idx,
                reason: "child index out of range",
            })?;
            match node {
                IsolationNode::Leaf { n_samples } => {
                    return Ok(depth as f64 + average_path_length(*n_samples));
                }
                IsolationNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = *x.get(*feature).ok_or(AnomalyError::FeatureIndexOutOfRange {
                        index: *feature,
                        len: x.len(),
                    })?;
                    idx = if v <= *threshold { *left } else { *right };
                    depth += 1;
                }
            }
        }
        Err(AnomalyError::MalformedTree {
            node: idx,
            reason: if self.nodes.is_empty() {
                "tree has no nodes"
            } else {
                "descent does not reach a leaf"
            },
        })
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Serialized isolation forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Sub-sample size each tree was grown on
    pub max_samples: usize,
    /// Subtracted from the raw score so that 0 separates inliers from outliers
    pub offset: f64,
    pub trees: Vec<IsolationTree>,
}

impl IsolationForest {
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.max_samples == 0 {
            return Err("max_samples must be positive".to_string());
        }
        if !self.offset.is_finite() {
            return Err("offset is not finite".to_string());
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|reason| format!("tree {t}: {reason}"))?;
        }
        Ok(())
    }

    /// Raw anomaly score in `[-1, 0)`; lower is more anomalous.
    pub fn score_samples(&self, x: &[f64]) -> Result<f64, AnomalyError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.path_length(x)?;
        }
        let mean_path = total / self.trees.len() as f64;
        let norm = average_path_length(self.max_samples);
        // A single-sample forest cannot isolate anything
        if norm == 0.0 {
            return Ok(-1.0);
        }
        Ok(-(2f64.powf(-mean_path / norm)))
    }
}

impl OutlierScorer for IsolationForest {
    fn decision(&self, row: &[f64]) -> Result<f64, AnomalyError> {
        Ok(self.score_samples(row)? - self.offset)
    }
}
