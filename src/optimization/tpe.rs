//! Tree-structured Parzen estimator sampler
//!
//! After a uniform warm-up, history is split into a small "good" set (top
//! scores) and the rest. Per dimension, each set is modelled as a mixture
//! of truncated Gaussians centred on its observations plus one wide prior
//! component. Candidates are drawn from the good density l(x) and the one
//! maximizing l(x) / g(x) is proposed. Dimensions are treated
//! independently.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use super::sampler::{sample_uniform, SequentialSampler};
use super::{SearchDimension, SearchSpace};
use crate::config::SamplerConfig;
use crate::types::OptimizationTrial;

/// Bandwidth floor is `width / min(100, 1 + n_observations)`.
const MAX_BANDWIDTH_DIVISOR: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct TpeSampler {
    rng: StdRng,
    n_startup_trials: usize,
    settings: SamplerConfig,
}

impl TpeSampler {
    pub fn new(seed: u64, n_startup_trials: usize) -> Self {
        Self::with_settings(seed, n_startup_trials, SamplerConfig::default())
    }

    pub fn with_settings(seed: u64, n_startup_trials: usize, settings: SamplerConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            n_startup_trials,
            settings,
        }
    }

    /// γ(n): size of the good set for `n` observed trials.
    fn n_good(&self, n: usize) -> usize {
        let by_fraction = (self.settings.good_fraction * n as f64).ceil() as usize;
        by_fraction.min(self.settings.max_good_trials).max(1).min(n)
    }

    fn propose_dimension(&mut self, dim: &SearchDimension, good: &[f64], bad: &[f64]) -> f64 {
        let l = ParzenEstimator::fit(good, dim.low, dim.high);
        let g = ParzenEstimator::fit(bad, dim.low, dim.high);

        let mut best: Option<(f64, f64)> = None;
        for _ in 0..self.settings.n_ei_candidates {
            let x = l.sample(&mut self.rng);
            let ratio = l.log_pdf(x) - g.log_pdf(x);
            if best.map_or(true, |(_, r)| ratio > r) {
                best = Some((x, ratio));
            }
        }
        best.map_or_else(|| self.rng.gen_range(dim.low..=dim.high), |(x, _)| x)
    }
}

impl SequentialSampler for TpeSampler {
    fn propose(&mut self, space: &SearchSpace, history: &[OptimizationTrial]) -> Vec<f64> {
        if history.is_empty() || history.len() < self.n_startup_trials {
            return sample_uniform(&mut self.rng, space);
        }

        // Stable sort: equal scores keep trial order
        let mut ranked: Vec<&OptimizationTrial> = history.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        let (good, bad) = ranked.split_at(self.n_good(history.len()));

        let mut point = Vec::with_capacity(space.len());
        for (d, dim) in space.dimensions().iter().enumerate() {
            let good_obs: Vec<f64> = good.iter().filter_map(|t| t.params.get(d).copied()).collect();
            let bad_obs: Vec<f64> = bad.iter().filter_map(|t| t.params.get(d).copied()).collect();
            point.push(self.propose_dimension(dim, &good_obs, &bad_obs));
        }
        point
    }
}

// ============================================================================
// Parzen estimator
// ============================================================================

/// Normal truncated to `[low, high]`.
#[derive(Debug, Clone)]
struct TruncatedNormal {
    normal: Normal,
    cdf_low: f64,
    cdf_high: f64,
    ln_mass: f64,
}

impl TruncatedNormal {
    fn new(mu: f64, sigma: f64, low: f64, high: f64) -> Option<Self> {
        let normal = Normal::new(mu, sigma).ok()?;
        let cdf_low = normal.cdf(low);
        let cdf_high = normal.cdf(high);
        let mass = cdf_high - cdf_low;
        if !(mass > 0.0) {
            return None;
        }
        Some(Self {
            normal,
            cdf_low,
            cdf_high,
            ln_mass: mass.ln(),
        })
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        self.normal.ln_pdf(x) - self.ln_mass
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        let u = rng.gen_range(self.cdf_low..self.cdf_high);
        self.normal.inverse_cdf(u)
    }
}

/// Equal-weight mixture of truncated normals over one dimension.
#[derive(Debug, Clone)]
struct ParzenEstimator {
    components: Vec<TruncatedNormal>,
    low: f64,
    high: f64,
}

impl ParzenEstimator {
    fn fit(observations: &[f64], low: f64, high: f64) -> Self {
        let width = high - low;
        let mut sorted = observations.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let min_sigma = width / MAX_BANDWIDTH_DIVISOR.min(1.0 + n as f64);

        let mut components = Vec::with_capacity(n + 1);
        for (i, &mu) in sorted.iter().enumerate() {
            let left = if i == 0 { low } else { sorted[i - 1] };
            let right = if i + 1 == n { high } else { sorted[i + 1] };
            let sigma = (mu - left).max(right - mu).clamp(min_sigma, width);
            components.extend(TruncatedNormal::new(mu, sigma, low, high));
        }
        // prior
        components.extend(TruncatedNormal::new(low + width / 2.0, width, low, high));

        Self { components, low, high }
    }

    fn log_pdf(&self, x: f64) -> f64 {
        if self.components.is_empty() {
            return -(self.high - self.low).ln();
        }
        let logs: Vec<f64> = self.components.iter().map(|c| c.ln_pdf(x)).collect();
        let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return max;
        }
        let sum: f64 = logs.iter().map(|l| (l - max).exp()).sum();
        max + sum.ln() - (self.components.len() as f64).ln()
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        if self.components.is_empty() {
            return rng.gen_range(self.low..=self.high);
        }
        let i = rng.gen_range(0..self.components.len());
        let x = self.components[i].sample(rng);
        if x.is_finite() {
            x.clamp(self.low, self.high)
        } else {
            rng.gen_range(self.low..=self.high)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space_1d() -> SearchSpace {
        SearchSpace::new(vec![SearchDimension::new("x", 0.0, 10.0)])
    }

    fn trial(number: usize, x: f64, score: f64) -> OptimizationTrial {
        OptimizationTrial {
            number,
            params: vec![x],
            score,
        }
    }

    #[test]
    fn test_good_set_size_follows_fraction_and_cap() {
        let s = TpeSampler::new(0, 0);
        assert_eq!(s.n_good(1), 1);
        assert_eq!(s.n_good(10), 1);
        assert_eq!(s.n_good(11), 2);
        assert_eq!(s.n_good(300), 25);
    }

    #[test]
    fn test_warm_up_ignores_history() {
        let space = space_1d();
        let history: Vec<_> = (0..5).map(|i| trial(i, 9.9, 100.0)).collect();
        let mut a = TpeSampler::new(3, 10);
        let mut b = TpeSampler::new(3, 10);
        // both still in warm-up, so history content does not matter
        assert_eq!(a.propose(&space, &history), b.propose(&space, &[]));
    }

    #[test]
    fn test_estimator_density_peaks_near_observations() {
        let est = ParzenEstimator::fit(&[2.0, 2.1, 1.9], 0.0, 10.0);
        assert!(est.log_pdf(2.0) > est.log_pdf(8.0));
    }

    #[test]
    fn test_estimator_samples_stay_in_bounds() {
        let est = ParzenEstimator::fit(&[0.0, 10.0], 0.0, 10.0);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let x = est.sample(&mut rng);
            assert!((0.0..=10.0).contains(&x));
        }
    }

    #[test]
    fn test_proposals_concentrate_in_good_region() {
        let space = space_1d();
        // Score peaks at x = 8
        let mut history = Vec::new();
        let mut warmup = crate::optimization::RandomSampler::new(11);
        for i in 0..40 {
            let x = warmup.propose(&space, &history)[0];
            history.push(trial(i, x, -(x - 8.0).powi(2)));
        }

        let mut tpe = TpeSampler::new(11, 10);
        let proposals: Vec<f64> = (0..20).map(|_| tpe.propose(&space, &history)[0]).collect();
        let mean = proposals.iter().sum::<f64>() / proposals.len() as f64;
        assert!((mean - 8.0).abs() < 2.5, "mean proposal {mean}");
    }
}
