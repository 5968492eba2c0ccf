//! Rejection sampling over a discrete table of non-negative weights.
use rand::RngCore;

use crate::error::{Error, Result};
use crate::sampling::{pick_index, rand01, RejectionStats};

/// Discrete weights with the bookkeeping needed for rejection sampling.
///
/// Weights need not be normalized. Only entries with positive weight are ever proposed.
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: Vec<f64>,
    eligible: Vec<usize>,
    max_weight: f64,
    total_weight: f64,
}

impl WeightTable {
    /// Validates `weights` and builds the table.
    ///
    /// Fails on an empty slice, on any negative or non-finite weight, and when every weight
    /// is zero.
    pub fn try_new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidConfig("weight table is empty".into()));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "weight at index {i} must be finite and >= 0, got {w}"
            )));
        }

        let eligible: Vec<usize> = weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0.0)
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            return Err(Error::EmptySupport("all weights are zero".into()));
        }

        let max_weight = eligible.iter().map(|&i| weights[i]).fold(0.0, f64::max);
        let total_weight = weights.iter().sum();

        Ok(Self {
            weights,
            eligible,
            max_weight,
            total_weight,
        })
    }

    /// Single entry of weight one.
    pub(crate) fn unit() -> Self {
        Self {
            weights: vec![1.0],
            eligible: vec![0],
            max_weight: 1.0,
            total_weight: 1.0,
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight at `index`, `0.0` when out of range.
    pub fn weight(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }

    /// Indices with positive weight, ascending.
    pub fn eligible(&self) -> &[usize] {
        &self.eligible
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Draw an index with probability proportional to its weight.
    pub fn sample(&self, rng: &mut dyn RngCore) -> usize {
        let mut stats = RejectionStats::default();
        self.sample_with_stats(rng, &mut stats)
    }

    /// Like [`WeightTable::sample`], recording attempts in `stats`.
    ///
    /// Candidates are drawn uniformly among eligible indices and accepted when a uniform
    /// value in `[0, max_weight)` falls at or below the candidate's weight. The loop always
    /// terminates because the maximum-weight entry accepts with probability one.
    pub fn sample_with_stats(&self, rng: &mut dyn RngCore, stats: &mut RejectionStats) -> usize {
        loop {
            let candidate = self.eligible[pick_index(rng, self.eligible.len())];
            let u = rand01(rng) * self.max_weight;
            stats.attempts += 1;
            if u <= self.weights[candidate] {
                stats.accepted += 1;
                return candidate;
            }
        }
    }
}
