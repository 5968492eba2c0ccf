#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sky_sim::prelude::*;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub const FLUX_MIN: f64 = 1.0;
pub const FLUX_MAX: f64 = 1.0e3;

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Euclidean-like counts with a matching envelope.
pub fn power_law() -> (PowerLaw, PowerLawEnvelope) {
    (
        PowerLaw::try_new(500.0, 2.5).unwrap(),
        PowerLawEnvelope::try_new(500.0, 2.5).unwrap(),
    )
}

/// Broken power law wrapped in a deliberately loose envelope.
pub fn broken_power_law() -> (BrokenPowerLaw, PowerLawEnvelope) {
    let dist = BrokenPowerLaw::try_new(2.0, vec![20.0], vec![1.6, 2.6]).unwrap();
    let env = PowerLawEnvelope::fitted(&dist, FLUX_MIN, FLUX_MAX, 1.6, 1.2).unwrap();
    (dist, env)
}

/// Template brighter toward the bottom of the grid.
pub fn gradient_template(grid: PixelGrid) -> SpatialTemplate {
    let weights: Vec<f64> = (0..grid.len())
        .map(|i| 1.0 + grid.coords(i).y as f64)
        .collect();
    SpatialTemplate::try_new(weights).unwrap()
}
