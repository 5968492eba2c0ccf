//! Spatial templates: relative source probability per pixel.
use crate::error::Result;
use crate::grid::PixelGrid;
use crate::sampling::WeightTable;

/// Non-negative per-pixel weights describing where sources are likely to appear.
///
/// Weights are relative; they are normalized internally and need not sum to one.
#[derive(Debug, Clone)]
pub struct SpatialTemplate {
    table: WeightTable,
}

impl SpatialTemplate {
    /// Validates `weights` (finite, non-negative, not all zero) and builds the template.
    pub fn try_new(weights: impl Into<Vec<f64>>) -> Result<Self> {
        Ok(Self {
            table: WeightTable::try_new(weights.into())?,
        })
    }

    /// Template whose length must match `grid`.
    pub fn for_grid(grid: &PixelGrid, weights: impl Into<Vec<f64>>) -> Result<Self> {
        let weights = weights.into();
        grid.check_len("spatial template", weights.len())?;
        Self::try_new(weights)
    }

    /// Flat template over `len` pixels.
    pub fn uniform(len: usize) -> Result<Self> {
        Self::try_new(vec![1.0; len])
    }

    /// Number of pixels covered by the template.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Raw weight of a pixel, `0.0` when out of range.
    pub fn weight(&self, pixel: usize) -> f64 {
        self.table.weight(pixel)
    }

    /// Normalized probability of a pixel.
    pub fn probability(&self, pixel: usize) -> f64 {
        self.table.weight(pixel) / self.table.total_weight()
    }

    pub fn total_weight(&self) -> f64 {
        self.table.total_weight()
    }

    pub fn max_weight(&self) -> f64 {
        self.table.max_weight()
    }

    /// Pixels with non-zero weight.
    pub fn eligible(&self) -> &[usize] {
        self.table.eligible()
    }

    pub(crate) fn table(&self) -> &WeightTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn probabilities_are_normalized() {
        let template = SpatialTemplate::try_new([1.0, 3.0, 0.0, 4.0]).unwrap();
        let sum: f64 = (0..template.len()).map(|i| template.probability(i)).sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(template.probability(3), 0.5);
        assert_eq!(template.eligible(), &[0, 1, 3]);
    }

    #[test]
    fn rejects_nan_negative_and_all_zero() {
        assert!(matches!(
            SpatialTemplate::try_new([1.0, f64::NAN]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SpatialTemplate::try_new([1.0, -2.0]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SpatialTemplate::try_new([0.0; 5]),
            Err(Error::EmptySupport(_))
        ));
        assert!(SpatialTemplate::uniform(0).is_err());
    }

    #[test]
    fn for_grid_checks_length() {
        let grid = PixelGrid::try_new(3, 2).unwrap();
        assert!(SpatialTemplate::for_grid(&grid, vec![1.0; 5]).is_err());
        assert_eq!(SpatialTemplate::for_grid(&grid, vec![1.0; 6]).unwrap().len(), 6);
    }
}
