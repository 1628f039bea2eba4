//! Core SetpointOptimizer: constrained multi-objective search over surrogates

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{AdvisorConfig, ObjectiveConfig, OptimizerSettings, SamplerConfig};
use crate::features::FeatureVectorAssembler;
use crate::surrogate::{RegistryError, SurrogateError, SurrogateModelRegistry};
use crate::types::{Context, OptimizationResult, OptimizationTrial};

use super::sampler::SequentialSampler;
use super::scoring::composite_score;
use super::tpe::TpeSampler;
use super::SearchSpace;

#[derive(Debug, thiserror::Error)]
pub enum OptimizationError {
    /// A surrogate failed mid-run; no partial result is produced.
    #[error("surrogate inference failed on trial {trial}: {source}")]
    Inference {
        trial: usize,
        #[source]
        source: SurrogateError,
    },

    #[error("optimization requires at least one trial")]
    NoTrials,

    /// Bounds the samplers cannot draw from or the rounding cannot honor.
    #[error("invalid search space: {}", .0.join("; "))]
    InvalidSearchSpace(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Lifecycle of one optimization run. Termination is purely trial-count
/// driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running { trial: usize },
    Terminal,
}

/// Trial history and phase for a single run. Owned by the call, never
/// shared between runs.
struct Study {
    phase: RunPhase,
    budget: usize,
    history: Vec<OptimizationTrial>,
    best: Option<usize>,
}

impl Study {
    fn new(budget: usize) -> Self {
        Self {
            phase: RunPhase::Idle,
            budget,
            history: Vec::with_capacity(budget),
            best: None,
        }
    }

    /// Advance to the next trial, or to `Terminal` once the budget is spent.
    fn next_trial(&mut self) -> Option<usize> {
        let next = self.history.len();
        self.phase = if next < self.budget {
            RunPhase::Running { trial: next }
        } else {
            RunPhase::Terminal
        };
        match self.phase {
            RunPhase::Running { trial } => Some(trial),
            _ => None,
        }
    }

    fn record(&mut self, trial: OptimizationTrial) {
        // strict: the earliest of equal scores wins
        let improves = self
            .best
            .map_or(true, |b| trial.score > self.history[b].score);
        if improves {
            self.best = Some(self.history.len());
        }
        self.history.push(trial);
    }

    fn history(&self) -> &[OptimizationTrial] {
        &self.history
    }

    fn best_trial(&self) -> Option<&OptimizationTrial> {
        debug_assert_eq!(self.phase, RunPhase::Terminal);
        self.best.map(|b| &self.history[b])
    }
}

/// Recommends controllable setpoints for a shift context.
///
/// Read-only after construction; each `optimize` call owns its own trial
/// history and sampler, so one optimizer can serve concurrent requests.
#[derive(Debug)]
pub struct SetpointOptimizer {
    registry: SurrogateModelRegistry,
    search_space: SearchSpace,
    objective: ObjectiveConfig,
    settings: OptimizerSettings,
    sampler: SamplerConfig,
}

impl SetpointOptimizer {
    pub fn new(registry: SurrogateModelRegistry, config: &AdvisorConfig) -> Self {
        Self {
            registry,
            search_space: config.search_space.clone(),
            objective: config.objective,
            settings: config.optimizer,
            sampler: config.sampler,
        }
    }

    /// Load the surrogate registry from `dir`.
    pub fn from_artifacts(dir: &Path, config: &AdvisorConfig) -> Result<Self, RegistryError> {
        Ok(Self::new(SurrogateModelRegistry::from_artifacts(dir)?, config))
    }

    pub fn registry(&self) -> &SurrogateModelRegistry {
        &self.registry
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    pub fn objective(&self) -> &ObjectiveConfig {
        &self.objective
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Run `n_trials` with the configured TPE sampler.
    ///
    /// Deterministic for a given seed, startup count, trial budget and set
    /// of surrogates.
    pub fn optimize(
        &self,
        context: &Context,
        n_trials: usize,
    ) -> Result<OptimizationResult, OptimizationError> {
        let mut sampler = TpeSampler::with_settings(
            self.settings.seed,
            self.settings.n_startup_trials,
            self.sampler,
        );
        self.optimize_with_sampler(context, n_trials, &mut sampler)
    }

    /// Run `n_trials` with an injected sampler.
    pub fn optimize_with_sampler(
        &self,
        context: &Context,
        n_trials: usize,
        sampler: &mut dyn SequentialSampler,
    ) -> Result<OptimizationResult, OptimizationError> {
        if n_trials == 0 {
            return Err(OptimizationError::NoTrials);
        }
        let problems = self.search_space.problems();
        if !problems.is_empty() {
            return Err(OptimizationError::InvalidSearchSpace(problems));
        }

        info!(
            n_trials,
            n_startup_trials = self.settings.n_startup_trials,
            seed = self.settings.seed,
            "Starting setpoint optimization"
        );

        let mut study = Study::new(n_trials);
        while let Some(number) = study.next_trial() {
            let params = sampler.propose(&self.search_space, study.history());
            let score = self
                .score(context, &params)
                .map_err(|source| OptimizationError::Inference { trial: number, source })?;
            debug!(trial = number, score, "Trial evaluated");
            study.record(OptimizationTrial { number, params, score });
        }

        let best = study.best_trial().ok_or(OptimizationError::NoTrials)?;
        let result = self
            .evaluate_best(context, best, n_trials)
            .map_err(|source| OptimizationError::Inference {
                trial: best.number,
                source,
            })?;

        info!(
            best_trial = result.best_trial,
            best_score = result.best_score,
            quality_pass_prob = result.quality_pass_prob,
            "Optimization complete"
        );
        Ok(result)
    }

    fn controllable(&self, params: &[f64]) -> HashMap<String, f64> {
        self.search_space
            .dimensions()
            .iter()
            .zip(params)
            .map(|(d, v)| (d.name.clone(), *v))
            .collect()
    }

    fn assemble(&self, context: &Context, params: &[f64]) -> Vec<f64> {
        FeatureVectorAssembler::assemble(
            self.registry.feature_order(),
            context,
            &self.controllable(params),
            self.registry.context_defaults(),
        )
        .into_inner()
    }

    fn score(&self, context: &Context, params: &[f64]) -> Result<f64, SurrogateError> {
        let x = self.assemble(context, params);
        let outcomes = self.registry.predict_all(&x)?;
        let q_prob = self.registry.quality_pass_probability(&x)?;
        Ok(composite_score(&self.objective, &outcomes, q_prob))
    }

    /// Re-run the winning point to collect every prediction for reporting.
    fn evaluate_best(
        &self,
        context: &Context,
        best: &OptimizationTrial,
        n_trials: usize,
    ) -> Result<OptimizationResult, SurrogateError> {
        let x = self.assemble(context, &best.params);
        Ok(OptimizationResult {
            recommended_setpoints: self.search_space.finalize(&best.params),
            predicted_outcomes: self.registry.predict_all(&x)?,
            quality_pass_prob: self.registry.quality_pass_probability(&x)?,
            rework_prob: self.registry.rework_probability(&x)?,
            best_score: best.score,
            n_trials,
            best_trial: best.number,
        })
    }
}

/// One-shot helper: load surrogates from `dir` and optimize `context`.
pub fn run_optimization(
    context: &Context,
    dir: &Path,
    n_trials: usize,
    config: &AdvisorConfig,
) -> Result<OptimizationResult, OptimizationError> {
    SetpointOptimizer::from_artifacts(dir, config)?.optimize(context, n_trials)
}
