//! Independent catalog and map realizations on a thread pool.
//!
//! Every realization owns a [`StdRng`] seeded from [`seed_for_realization`], so the output for
//! a given base seed does not depend on the number of worker threads.
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{Catalog, CatalogBuilder};
use crate::error::Result;
use crate::render::{CountsMap, MapRenderer};

/// One simulated sky: the catalog and the counts map rendered from it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Realization {
    /// Position in the batch.
    pub index: u64,
    /// Seed of the random stream that produced this realization.
    pub seed: u64,
    pub catalog: Catalog,
    pub counts: CountsMap,
}

/// Derive a deterministic seed for a realization from a base seed and its index.
pub fn seed_for_realization(base_seed: u64, index: u64) -> u64 {
    mix_u64(base_seed ^ index.wrapping_add(1).wrapping_mul(0x9E3779B97F4A7C15))
}

#[inline]
fn mix_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// Builds and renders a single realization from its own random stream.
pub fn run_realization(
    builder: &CatalogBuilder<'_>,
    renderer: &MapRenderer<'_>,
    base_seed: u64,
    index: u64,
) -> Result<Realization> {
    let seed = seed_for_realization(base_seed, index);
    let mut rng = StdRng::seed_from_u64(seed);
    let report = builder.build(&mut rng)?;
    let counts = renderer.render(&report.catalog, &mut rng)?;
    Ok(Realization {
        index,
        seed,
        catalog: report.catalog,
        counts,
    })
}

/// Runs `count` realizations in parallel and returns them in index order.
///
/// If any realization fails, returns the error of the lowest failing index.
pub fn generate_realizations(
    builder: &CatalogBuilder<'_>,
    renderer: &MapRenderer<'_>,
    base_seed: u64,
    count: u64,
) -> Result<Vec<Realization>> {
    info!(
        "Generating {} realizations from base seed {} on {} threads.",
        count,
        base_seed,
        rayon::current_num_threads()
    );
    let runs: Vec<Result<Realization>> = (0..count)
        .into_par_iter()
        .map(|index| run_realization(builder, renderer, base_seed, index))
        .collect();
    runs.into_iter().collect()
}
