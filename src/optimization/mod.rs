//! Setpoint Optimization Engine
//!
//! Sequential model-based search over the bounded controllable-variable
//! space. Every proposal is scored through the surrogates with a fixed
//! weighted objective and a quality-probability constraint; the best trial
//! after a fixed budget becomes the recommendation.

mod optimizer;
mod sampler;
mod scoring;
mod search_space;
mod tpe;

pub use optimizer::{run_optimization, OptimizationError, RunPhase, SetpointOptimizer};
pub use sampler::{RandomSampler, SequentialSampler};
pub use scoring::composite_score;
pub use search_space::{Rounding, SearchDimension, SearchSpace};
pub use tpe::TpeSampler;
