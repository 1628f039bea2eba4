//! Surrogate model registry: loaded regressors plus the two binary classifiers

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

use crate::features::FeatureOrder;
use crate::types::variables::{QUALITY_PASS_TARGET, REGRESSION_TARGETS, REWORK_TARGET};
use crate::types::{Availability, Outcomes};

use super::artifacts::{self, ArtifactError};
use super::models::{ClassifierArtifact, RegressorArtifact};
use super::{ProbabilityPredictor, ScalarPredictor, SurrogateError};

/// Fatal registry construction failures.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// `feature_cols.json` is absent.
    #[error("feature order unavailable: {0}")]
    ConfigMissing(#[source] ArtifactError),

    /// `feature_cols.json` exists but cannot be used.
    #[error("feature order unusable: {0}")]
    InvalidArtifact(#[source] ArtifactError),
}

impl From<ArtifactError> for RegistryError {
    fn from(e: ArtifactError) -> Self {
        if e.is_not_found() {
            Self::ConfigMissing(e)
        } else {
            Self::InvalidArtifact(e)
        }
    }
}

/// Read-only collection of trained surrogates sharing one feature order.
///
/// Missing regressors are simply absent from [`predict_all`]; missing
/// classifiers fall back to optimistic probabilities (quality pass = 1.0,
/// rework = 0.0) so the search runs unconstrained instead of failing.
///
/// [`predict_all`]: SurrogateModelRegistry::predict_all
pub struct SurrogateModelRegistry {
    feature_order: FeatureOrder,
    context_defaults: HashMap<String, f64>,
    regressors: BTreeMap<String, Box<dyn ScalarPredictor>>,
    quality_pass: Availability<Box<dyn ProbabilityPredictor>>,
    rework: Availability<Box<dyn ProbabilityPredictor>>,
    missing: Vec<String>,
}

impl std::fmt::Debug for SurrogateModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrogateModelRegistry")
            .field("features", &self.feature_order.len())
            .field("regressors", &self.regressors.keys().collect::<Vec<_>>())
            .field("quality_pass", &self.quality_pass.is_loaded())
            .field("rework", &self.rework.is_loaded())
            .finish()
    }
}

impl SurrogateModelRegistry {
    /// Empty registry over a known feature order.
    pub fn new(feature_order: FeatureOrder) -> Self {
        Self {
            feature_order,
            context_defaults: HashMap::new(),
            regressors: BTreeMap::new(),
            quality_pass: Availability::unavailable("not loaded"),
            rework: Availability::unavailable("not loaded"),
            missing: Vec::new(),
        }
    }

    pub fn with_regressor(
        mut self,
        target: impl Into<String>,
        model: impl ScalarPredictor + 'static,
    ) -> Self {
        self.regressors.insert(target.into(), Box::new(model));
        self
    }

    pub fn with_quality_classifier(mut self, model: impl ProbabilityPredictor + 'static) -> Self {
        self.quality_pass = Availability::Loaded(Box::new(model));
        self
    }

    pub fn with_rework_classifier(mut self, model: impl ProbabilityPredictor + 'static) -> Self {
        self.rework = Availability::Loaded(Box::new(model));
        self
    }

    pub fn with_context_defaults(mut self, defaults: HashMap<String, f64>) -> Self {
        self.context_defaults = defaults;
        self
    }

    /// Load every surrogate found in `dir`.
    ///
    /// Only a missing or unreadable `feature_cols.json` is fatal. Every
    /// other artifact degrades to its fallback and is listed in
    /// [`missing_models`](Self::missing_models).
    pub fn from_artifacts(dir: &Path) -> Result<Self, RegistryError> {
        let order_path = dir.join(artifacts::FEATURE_ORDER_FILE);
        let feature_order: FeatureOrder = artifacts::read_json(&order_path)?;
        info!(
            path = %order_path.display(),
            features = feature_order.len(),
            "Loaded feature order"
        );

        let mut registry = Self::new(feature_order);

        for target in REGRESSION_TARGETS {
            let path = artifacts::regressor_path(dir, target);
            match load_regressor(&path) {
                Ok(model) => {
                    info!(target, path = %path.display(), "Loaded regressor");
                    registry.regressors.insert(target.to_string(), Box::new(model));
                }
                Err(e) => {
                    warn!(target, error = %e, "Regressor unavailable");
                    registry.missing.push(format!("{target} regressor ({e})"));
                }
            }
        }

        registry.quality_pass = registry.load_classifier_slot(dir, QUALITY_PASS_TARGET);
        registry.rework = registry.load_classifier_slot(dir, REWORK_TARGET);

        let defaults_path = dir.join(artifacts::CONTEXT_DEFAULTS_FILE);
        match artifacts::read_json::<HashMap<String, f64>>(&defaults_path) {
            Ok(defaults) => {
                info!(columns = defaults.len(), "Loaded context defaults");
                registry.context_defaults = defaults;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable context defaults"),
        }

        Ok(registry)
    }

    fn load_classifier_slot(
        &mut self,
        dir: &Path,
        target: &str,
    ) -> Availability<Box<dyn ProbabilityPredictor>> {
        let path = artifacts::classifier_path(dir, target);
        match load_classifier(&path) {
            Ok(model) => {
                info!(target, path = %path.display(), "Loaded classifier");
                Availability::Loaded(Box::new(model))
            }
            Err(e) => {
                warn!(target, error = %e, "Classifier unavailable, using optimistic fallback");
                self.missing.push(format!("{target} classifier ({e})"));
                Availability::unavailable(e.to_string())
            }
        }
    }

    pub fn feature_order(&self) -> &FeatureOrder {
        &self.feature_order
    }

    pub fn context_defaults(&self) -> &HashMap<String, f64> {
        &self.context_defaults
    }

    /// Targets with a loaded regressor, in name order.
    pub fn regressor_targets(&self) -> impl Iterator<Item = &str> {
        self.regressors.keys().map(String::as_str)
    }

    /// Optional artifacts that failed to load, with their causes.
    pub fn missing_models(&self) -> &[String] {
        &self.missing
    }

    /// Run every loaded regressor.
    pub fn predict_all(&self, features: &[f64]) -> Result<Outcomes, SurrogateError> {
        let mut out = Outcomes::new();
        for (target, model) in &self.regressors {
            out.insert(target.clone(), model.predict(features)?);
        }
        Ok(out)
    }

    /// P(quality_grade_pass = 1); 1.0 when no classifier is loaded.
    pub fn quality_pass_probability(&self, features: &[f64]) -> Result<f64, SurrogateError> {
        match self.quality_pass.as_loaded() {
            Some(model) => model.predict_proba(features),
            None => Ok(1.0),
        }
    }

    /// P(rework_required = 1); 0.0 when no classifier is loaded.
    pub fn rework_probability(&self, features: &[f64]) -> Result<f64, SurrogateError> {
        match self.rework.as_loaded() {
            Some(model) => model.predict_proba(features),
            None => Ok(0.0),
        }
    }
}

fn load_regressor(path: &Path) -> Result<RegressorArtifact, ArtifactError> {
    let model: RegressorArtifact = artifacts::read_json(path)?;
    model.validate().map_err(|reason| ArtifactError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(model)
}

fn load_classifier(path: &Path) -> Result<ClassifierArtifact, ArtifactError> {
    let model: ClassifierArtifact = artifacts::read_json(path)?;
    model.validate().map_err(|reason| ArtifactError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(model)
}
