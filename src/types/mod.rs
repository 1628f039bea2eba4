//! Shared data structures for the setpoint recommendation pipeline
//!
//! - `variables`: canonical column names (controllable, context, targets)
//! - `availability`: loaded-or-unavailable wrapper for optional artifacts
//! - `optimization`: contexts, trials, optimizer results
//! - `anomaly`: anomaly gate output
//! - `recommendation`: orchestrator output and its JSON report

pub mod variables;

mod anomaly;
mod availability;
mod optimization;
mod recommendation;

pub use anomaly::*;
pub use availability::*;
pub use optimization::*;
pub use recommendation::*;
