//! Setpoint Advisor: shift setpoint recommendations for a steel melt shop
//!
//! Trained surrogate models stand in for the furnace. A sequential
//! model-based optimizer searches the controllable levers for the best
//! composite outcome under a quality constraint, and an anomaly gate flags
//! contexts the surrogates were never trained on.
//!
//! ## Architecture
//!
//! - **Features**: canonical feature ordering and vector assembly
//! - **Surrogate**: regressor/classifier artifacts and their registry
//! - **Anomaly**: isolation-forest gate over the shift context
//! - **Optimization**: search space, objective, samplers, optimizer
//! - **Recommend**: orchestration of gate + optimizer into one result

pub mod anomaly;
pub mod config;
pub mod features;
pub mod optimization;
pub mod recommend;
pub mod surrogate;
pub mod types;

// Re-export configuration
pub use config::{AdvisorConfig, ConfigError};

// Re-export commonly used types
pub use types::{
    AnomalyResult, Availability, Context, OptimizationResult, OptimizationTrial,
    PredictedOutcomes, RecommendationReport, RecommendationResult,
};

// Re-export pipeline components
pub use anomaly::{AnomalyError, AnomalyGate, OutlierScorer};
pub use features::{FeatureOrder, FeatureVector, FeatureVectorAssembler};
pub use optimization::{
    run_optimization, OptimizationError, RandomSampler, SearchSpace, SequentialSampler,
    SetpointOptimizer, TpeSampler,
};
pub use recommend::{parse_context, InputError, RecommendOptions, RecommendationOrchestrator};
pub use surrogate::{
    ProbabilityPredictor, RegistryError, ScalarPredictor, SurrogateError, SurrogateModelRegistry,
};
