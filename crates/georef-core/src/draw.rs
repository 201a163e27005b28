//! Seeded source of normal variates.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Reproducible generator of independent normal draws.
///
/// The same seed and the same sequence of calls always produce bit-identical
/// draws.
#[derive(Clone, Debug)]
pub struct DrawSource {
    seed: u64,
    rng: StdRng,
}

impl DrawSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Independent generator for one simulation iteration, seeded from
    /// `base_seed + iteration`.
    pub fn for_iteration(base_seed: u64, iteration: usize) -> Self {
        Self::new(base_seed.wrapping_add(iteration as u64))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One draw from `Normal(mean, stderr^2)`.
    ///
    /// `stderr` must be finite and non-negative. A zero `stderr` returns
    /// exactly `mean` but still advances the sequence.
    #[inline]
    pub fn normal(&mut self, mean: f64, stderr: f64) -> f64 {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        if stderr == 0.0 {
            return mean;
        }
        mean + stderr * z
    }
}
