//! Instrument response kernels (point-spread functions) on the pixel grid.
use glam::IVec2;
use rand::RngCore;

use crate::error::{Error, Result};
use crate::sampling::WeightTable;

/// A normalized point-spread function sampled on an odd-sized pixel patch.
///
/// The center cell of the patch sits on the source's host pixel. Weights sum to one, so a
/// source whose whole footprint lies on the grid deposits exactly its flux.
#[derive(Debug, Clone)]
pub struct ResponseKernel {
    width: u32,
    height: u32,
    table: WeightTable,
}

impl ResponseKernel {
    /// The identity response: all flux stays in the host pixel.
    pub fn delta() -> Self {
        Self {
            width: 1,
            height: 1,
            table: WeightTable::unit(),
        }
    }

    /// Builds a kernel from a `width * height` row-major patch of weights.
    ///
    /// Both dimensions must be odd. Weights must be finite, non-negative and not all zero;
    /// they are normalized to sum to one.
    pub fn from_weights(width: u32, height: u32, weights: Vec<f64>) -> Result<Self> {
        if width % 2 == 0 || height % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "kernel dimensions must be odd, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if weights.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "kernel of {width}x{height} needs {expected} weights, got {}",
                weights.len()
            )));
        }

        let raw = WeightTable::try_new(weights)?;
        let total = raw.total_weight();
        let normalized = raw.weights().iter().map(|w| w / total).collect();
        Ok(Self {
            width,
            height,
            table: WeightTable::try_new(normalized)?,
        })
    }

    /// Square kernel of side `2 * radius + 1` whose cells hold `profile(r)`, with `r` the
    /// distance in pixels between the cell center and the kernel center.
    pub fn from_radial_fn<F>(radius: u32, profile: F) -> Result<Self>
    where
        F: Fn(f64) -> f64,
    {
        let side = 2 * radius + 1;
        let r = radius as i32;
        let mut weights = Vec::with_capacity(side as usize * side as usize);
        for dy in -r..=r {
            for dx in -r..=r {
                let dist = ((dx * dx + dy * dy) as f64).sqrt();
                weights.push(profile(dist));
            }
        }
        Self::from_weights(side, side, weights)
    }

    /// Circular Gaussian with standard deviation `sigma` pixels, truncated at `radius` pixels.
    pub fn gaussian(sigma: f64, radius: u32) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "gaussian sigma must be finite and > 0, got {sigma}"
            )));
        }
        let inv_two_var = 1.0 / (2.0 * sigma * sigma);
        Self::from_radial_fn(radius, |r| (-r * r * inv_two_var).exp())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `true` for a single-cell kernel.
    pub fn is_delta(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Normalized weights, row-major.
    pub fn weights(&self) -> &[f64] {
        self.table.weights()
    }

    #[inline]
    fn cell_offset(&self, cell: usize) -> IVec2 {
        let w = self.width as usize;
        IVec2::new(
            (cell % w) as i32 - (self.width / 2) as i32,
            (cell / w) as i32 - (self.height / 2) as i32,
        )
    }

    /// Non-zero cells as `(offset from host pixel, weight)`.
    pub fn footprint(&self) -> impl Iterator<Item = (IVec2, f64)> + '_ {
        self.table
            .eligible()
            .iter()
            .map(move |&cell| (self.cell_offset(cell), self.table.weight(cell)))
    }

    /// Draw a single photon displacement from the kernel by rejection.
    pub fn sample_offset(&self, rng: &mut dyn RngCore) -> IVec2 {
        self.cell_offset(self.table.sample(rng))
    }
}

impl Default for ResponseKernel {
    fn default() -> Self {
        Self::delta()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn delta_kernel_has_single_unit_cell() {
        let k = ResponseKernel::delta();
        assert!(k.is_delta());
        let cells: Vec<_> = k.footprint().collect();
        assert_eq!(cells, vec![(IVec2::ZERO, 1.0)]);
    }

    #[test]
    fn weights_are_normalized() {
        let k = ResponseKernel::from_weights(3, 1, vec![1.0, 2.0, 1.0]).unwrap();
        assert_eq!(k.weights(), &[0.25, 0.5, 0.25]);
        let offsets: Vec<IVec2> = k.footprint().map(|(o, _)| o).collect();
        assert_eq!(
            offsets,
            vec![IVec2::new(-1, 0), IVec2::new(0, 0), IVec2::new(1, 0)]
        );
    }

    #[test]
    fn rejects_invalid_shapes() {
        assert!(ResponseKernel::from_weights(2, 1, vec![1.0, 1.0]).is_err());
        assert!(ResponseKernel::from_weights(3, 3, vec![1.0; 8]).is_err());
        assert!(ResponseKernel::from_weights(1, 1, vec![0.0]).is_err());
        assert!(ResponseKernel::from_weights(1, 1, vec![-1.0]).is_err());
        assert!(ResponseKernel::gaussian(0.0, 2).is_err());
    }

    #[test]
    fn gaussian_is_symmetric_and_peaked() {
        let k = ResponseKernel::gaussian(1.0, 2).unwrap();
        assert_eq!((k.width(), k.height()), (5, 5));
        let w = k.weights();
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        let center = w[12];
        assert!(w.iter().all(|v| *v <= center));
        assert!((w[11] - w[13]).abs() < 1e-15);
        assert!((w[7] - w[17]).abs() < 1e-15);
    }

    #[test]
    fn sampled_offsets_follow_weights() {
        let k = ResponseKernel::from_weights(3, 1, vec![1.0, 2.0, 1.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(12);
        let n = 20_000;
        let center = (0..n)
            .filter(|_| k.sample_offset(&mut rng) == IVec2::ZERO)
            .count();
        let frac = center as f64 / n as f64;
        assert!((frac - 0.5).abs() < 0.02, "fraction {frac}");
    }
}
