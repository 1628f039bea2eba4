//! Feature vector assembly
//!
//! Every surrogate was trained on rows whose columns follow one canonical
//! ordering (`feature_cols.json`). The assembler merges the value sources
//! for a query and lays them out in exactly that order.
//!
//! Merge priority, lowest to highest: defaults, context, controllable.
//! Columns absent from all sources are filled with `0.0`; extra keys are
//! ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Deref;

/// Canonical column ordering persisted alongside the trained surrogates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureOrder(Vec<String>);

impl FeatureOrder {
    pub fn new(columns: Vec<String>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of a column, if present.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.0.iter().position(|c| c == column)
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureOrder {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Dense model input, positionally aligned with a `FeatureOrder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for FeatureVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Stateless merger of value maps into model-ready vectors.
pub struct FeatureVectorAssembler;

impl FeatureVectorAssembler {
    /// Build a vector for `feature_order` from the three value sources.
    ///
    /// Output length always equals `feature_order.len()`.
    pub fn assemble<C, P, D>(
        feature_order: &FeatureOrder,
        context: &HashMap<String, f64, C>,
        controllable: &HashMap<String, f64, P>,
        defaults: &HashMap<String, f64, D>,
    ) -> FeatureVector
    where
        C: std::hash::BuildHasher,
        P: std::hash::BuildHasher,
        D: std::hash::BuildHasher,
    {
        let values = feature_order
            .columns()
            .iter()
            .map(|col| {
                controllable
                    .get(col)
                    .or_else(|| context.get(col))
                    .or_else(|| defaults.get(col))
                    .copied()
                    .unwrap_or(0.0)
            })
            .collect();
        FeatureVector(values)
    }

    /// Single-source variant: lay out one map in `feature_order`.
    pub fn assemble_row<S: std::hash::BuildHasher>(
        feature_order: &FeatureOrder,
        row: &HashMap<String, f64, S>,
    ) -> FeatureVector {
        let values = feature_order
            .columns()
            .iter()
            .map(|col| row.get(col).copied().unwrap_or(0.0))
            .collect();
        FeatureVector(values)
    }
}
