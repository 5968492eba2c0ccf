//! Expected-intensity and observed-counts maps.
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::PixelGrid;
use crate::sampling::sample_poisson;

/// Real-valued expected counts per pixel, before Poisson noise.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensityMap {
    grid: PixelGrid,
    values: Vec<f64>,
}

impl IntensityMap {
    /// All-zero map over `grid`.
    pub fn zeros(grid: PixelGrid) -> Self {
        Self {
            grid,
            values: vec![0.0; grid.len()],
        }
    }

    pub fn grid(&self) -> PixelGrid {
        self.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Expected counts in `pixel`, `0.0` when outside the grid.
    pub fn get(&self, pixel: usize) -> f64 {
        self.values.get(pixel).copied().unwrap_or(0.0)
    }

    /// Sum over all pixels.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    #[inline]
    pub(crate) fn add(&mut self, pixel: usize, amount: f64) {
        self.values[pixel] += amount;
    }

    /// Draws a counts map with an independent Poisson variate per pixel.
    pub fn realize<R: RngCore>(&self, rng: &mut R) -> CountsMap {
        let counts = self
            .values
            .iter()
            .map(|&mean| sample_poisson(mean, rng))
            .collect();
        CountsMap {
            grid: self.grid,
            counts,
        }
    }
}

/// Integer photon counts per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CountsMap {
    grid: PixelGrid,
    counts: Vec<u64>,
}

impl CountsMap {
    pub(crate) fn zeros(grid: PixelGrid) -> Self {
        Self {
            grid,
            counts: vec![0; grid.len()],
        }
    }

    pub fn grid(&self) -> PixelGrid {
        self.grid
    }

    pub fn values(&self) -> &[u64] {
        &self.counts
    }

    /// Counts in `pixel`, `0` when outside the grid.
    pub fn get(&self, pixel: usize) -> u64 {
        self.counts.get(pixel).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn into_counts(self) -> Vec<u64> {
        self.counts
    }

    #[inline]
    pub(crate) fn add(&mut self, pixel: usize, amount: u64) {
        self.counts[pixel] += amount;
    }
}
