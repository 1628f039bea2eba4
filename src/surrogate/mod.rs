//! Surrogate models: trained stand-ins for the furnace.
//!
//! Two capability shapes are exposed:
//! - [`ScalarPredictor`]: one continuous prediction (yield, energy cost, ...)
//! - [`ProbabilityPredictor`]: positive-class probability in `[0, 1]`
//!
//! `models` holds the serialized formats written by the training pipeline;
//! `registry` loads them from an artifact directory and answers the
//! optimizer's inference queries.

pub mod artifacts;
pub mod models;
mod registry;

pub use artifacts::ArtifactError;
pub use models::{ClassifierArtifact, RegressorArtifact};
pub use registry::{RegistryError, SurrogateModelRegistry};

/// Inference failure inside a surrogate. Aborts an optimization run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurrogateError {
    #[error("model expects {expected} features, vector has {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("split references feature {index}, vector has {len}")]
    FeatureIndexOutOfRange { index: usize, len: usize },

    #[error("malformed tree at node {node}: {reason}")]
    MalformedTree { node: usize, reason: &'static str },

    #[error("model produced non-finite output {0}")]
    NonFinite(f64),

    #[error("{0}")]
    Other(String),
}

/// Continuous-target surrogate.
///
/// Implementations must be read-only after construction so a registry can
/// be shared across threads.
pub trait ScalarPredictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, SurrogateError>;
}

/// Binary-target surrogate returning P(positive class).
pub trait ProbabilityPredictor: Send + Sync {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, SurrogateError>;
}

impl<F> ScalarPredictor for F
where
    F: Fn(&[f64]) -> Result<f64, SurrogateError> + Send + Sync,
{
    fn predict(&self, features: &[f64]) -> Result<f64, SurrogateError> {
        self(features)
    }
}

impl<F> ProbabilityPredictor for F
where
    F: Fn(&[f64]) -> Result<f64, SurrogateError> + Send + Sync,
{
    fn predict_proba(&self, features: &[f64]) -> Result<f64, SurrogateError> {
        self(features)
    }
}
