//! Analytic number-count shapes.
use crate::distribution::NumberCount;
use crate::error::{Error, Result};

/// Single power law `dN/dS = norm * S^-index` for `S > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    pub norm: f64,
    pub index: f64,
}

impl PowerLaw {
    pub fn try_new(norm: f64, index: f64) -> Result<Self> {
        if !norm.is_finite() || norm < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "power-law norm must be finite and >= 0, got {norm}"
            )));
        }
        if !index.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "power-law index must be finite, got {index}"
            )));
        }
        Ok(Self { norm, index })
    }
}

impl NumberCount for PowerLaw {
    #[inline]
    fn density(&self, flux: f64) -> f64 {
        if flux > 0.0 {
            self.norm * flux.powf(-self.index)
        } else {
            0.0
        }
    }

    fn integral(&self, lo: f64, hi: f64) -> f64 {
        let valid = lo > 0.0 && hi > lo && hi.is_finite();
        if !valid {
            return 0.0;
        }
        let p = 1.0 - self.index;
        if p.abs() < 1e-12 {
            self.norm * (hi / lo).ln()
        } else {
            self.norm * (hi.powf(p) - lo.powf(p)) / p
        }
    }
}

/// Multiply broken power law.
///
/// With ascending breaks `b_1 < ... < b_k` and indices `n_0, ..., n_k`, segment `j` covers
/// `[b_j, b_{j+1})` (with `b_0 = 0` and `b_{k+1} = inf`) and follows `S^-n_j`. Segments join
/// continuously. `norm` is the density at the highest break, so the top segment reads
/// `norm * (S / b_k)^-n_k`.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenPowerLaw {
    breaks: Vec<f64>,
    segments: Vec<PowerLaw>,
}

impl BrokenPowerLaw {
    /// Builds the law from `norm`, ascending `breaks`, and `breaks.len() + 1` indices
    /// ordered from the faintest segment to the brightest.
    pub fn try_new(norm: f64, breaks: Vec<f64>, indices: Vec<f64>) -> Result<Self> {
        if breaks.is_empty() {
            return Err(Error::InvalidConfig(
                "broken power law needs at least one break; use PowerLaw instead".into(),
            ));
        }
        if indices.len() != breaks.len() + 1 {
            return Err(Error::InvalidConfig(format!(
                "broken power law with {} breaks needs {} indices, got {}",
                breaks.len(),
                breaks.len() + 1,
                indices.len()
            )));
        }
        if breaks.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(Error::InvalidConfig(
                "breaks must be finite and > 0".into(),
            ));
        }
        if breaks.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig(
                "breaks must be strictly ascending".into(),
            ));
        }

        let top = breaks.len();
        let top_index = indices[top];
        let mut segments = vec![PowerLaw::try_new(0.0, 0.0)?; top + 1];
        segments[top] = PowerLaw::try_new(norm * breaks[top - 1].powf(top_index), top_index)?;
        for j in (0..top).rev() {
            let b = breaks[j];
            let above = segments[j + 1];
            let coeff = above.norm * b.powf(indices[j] - above.index);
            segments[j] = PowerLaw::try_new(coeff, indices[j])?;
        }

        Ok(Self { breaks, segments })
    }

    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }

    fn segment_for(&self, flux: f64) -> &PowerLaw {
        let j = self.breaks.partition_point(|b| *b <= flux);
        &self.segments[j]
    }

    fn segment_bounds(&self, j: usize) -> (f64, f64) {
        let lower = if j == 0 { 0.0 } else { self.breaks[j - 1] };
        let upper = self.breaks.get(j).copied().unwrap_or(f64::INFINITY);
        (lower, upper)
    }
}

impl NumberCount for BrokenPowerLaw {
    #[inline]
    fn density(&self, flux: f64) -> f64 {
        self.segment_for(flux).density(flux)
    }

    fn integral(&self, lo: f64, hi: f64) -> f64 {
        let valid = lo > 0.0 && hi > lo && hi.is_finite();
        if !valid {
            return 0.0;
        }
        self.segments
            .iter()
            .enumerate()
            .map(|(j, seg)| {
                let (lower, upper) = self.segment_bounds(j);
                seg.integral(lo.max(lower), hi.min(upper))
            })
            .sum()
    }
}
