//! Random draw service used by every stochastic operator.
//!
//! The engine never touches an RNG directly; all draws go through the
//! `DrawEngine` trait so the generator can be swapped or mocked in tests.
//! Names follow the notation of the Zhang & Sanderson book: rand, randn,
//! randc and randint.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Cauchy, Distribution, Normal};

/// Strategy over the four draw kinds the operator pipeline needs.
pub trait DrawEngine {
    /// Uniform draw from [lbound, ubound).
    fn rand_uniform(&mut self, lbound: f64, ubound: f64) -> f64;

    /// Draw from a normal distribution with the given mean and standard
    /// deviation.
    fn rand_normal(&mut self, mean: f64, stddev: f64) -> f64;

    /// Draw from a Cauchy distribution with the given location and scale.
    fn rand_cauchy(&mut self, location: f64, scale: f64) -> f64;

    /// Integer draw from [lbound, ubound).
    fn rand_index(&mut self, lbound: usize, ubound: usize) -> usize;
}

/// Default draw engine backed by `StdRng`.
pub struct StdDrawEngine {
    rng: StdRng,
}

impl StdDrawEngine {
    /// Seeded when `seed` is given, otherwise initialized from the thread
    /// RNG.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => {
                let mut thread_rng = rand::rng();
                StdRng::from_rng(&mut thread_rng)
            }
        };
        Self { rng }
    }
}

impl DrawEngine for StdDrawEngine {
    fn rand_uniform(&mut self, lbound: f64, ubound: f64) -> f64 {
        if lbound >= ubound {
            return lbound;
        }
        lbound + self.rng.random::<f64>() * (ubound - lbound)
    }

    fn rand_normal(&mut self, mean: f64, stddev: f64) -> f64 {
        match Normal::new(mean, stddev) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    fn rand_cauchy(&mut self, location: f64, scale: f64) -> f64 {
        match Cauchy::new(location, scale) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => location,
        }
    }

    fn rand_index(&mut self, lbound: usize, ubound: usize) -> usize {
        if lbound >= ubound {
            return lbound;
        }
        self.rng.random_range(lbound..ubound)
    }
}
