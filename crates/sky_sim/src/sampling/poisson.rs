//! Poisson variate generation.
//!
//! Small means use Knuth's multiplication method. Means of 10 and above go through
//! [`rand_distr::Poisson`], which stays exact for very large means where `exp(-lambda)`
//! would underflow.
use rand::RngCore;
use rand_distr::{Distribution, Poisson};

use crate::sampling::rand01;

const KNUTH_LIMIT: f64 = 10.0;

/// Draw a Poisson-distributed count with mean `lambda`.
///
/// Non-positive or non-finite means yield `0`.
pub fn sample_poisson(lambda: f64, rng: &mut dyn RngCore) -> u64 {
    if !lambda.is_finite() || lambda <= 0.0 {
        return 0;
    }
    if lambda < KNUTH_LIMIT {
        poisson_knuth(lambda, rng)
    } else {
        poisson_large(lambda, rng)
    }
}

fn poisson_knuth(lambda: f64, rng: &mut dyn RngCore) -> u64 {
    let limit = (-lambda).exp();
    let mut k: u64 = 0;
    let mut p = 1.0;
    loop {
        p *= rand01(rng);
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

fn poisson_large(lambda: f64, rng: &mut dyn RngCore) -> u64 {
    match Poisson::new(lambda) {
        Ok(dist) => {
            let k: f64 = dist.sample(rng);
            k as u64
        }
        // Means this large no longer fit in a u64 count.
        Err(_) => u64::MAX,
    }
}
