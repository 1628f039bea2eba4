//! Sequential sampler contract

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;

use super::SearchSpace;
use crate::types::OptimizationTrial;

/// Proposes the next point of a sequential search.
///
/// Given the bounds and every trial observed so far, return one value per
/// search dimension, in dimension order, inside the dimension's bounds.
/// Implementations own their random state so one run is reproducible from
/// its seed.
pub trait SequentialSampler {
    fn propose(&mut self, space: &SearchSpace, history: &[OptimizationTrial]) -> Vec<f64>;
}

/// Uniform draw over every dimension.
pub(crate) fn sample_uniform(rng: &mut StdRng, space: &SearchSpace) -> Vec<f64> {
    space
        .dimensions()
        .iter()
        .map(|d| rng.sample(Uniform::new_inclusive(d.low, d.high)))
        .collect()
}

/// Ignores history; every proposal is uniform.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SequentialSampler for RandomSampler {
    fn propose(&mut self, space: &SearchSpace, _history: &[OptimizationTrial]) -> Vec<f64> {
        sample_uniform(&mut self.rng, space)
    }
}
