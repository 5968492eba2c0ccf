//! Pixel grid utilities for templates and maps.
//!
//! This module defines [`PixelGrid`], a row-major 2D grid of pixels. Templates, kernels and
//! maps all address pixels by their flat index into this grid.
use glam::{IVec2, UVec2};
use mint::Vector2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Row-major pixel grid. Pixel `(x, y)` has flat index `y * width + x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelGrid {
    width: u32,
    height: u32,
}

impl PixelGrid {
    /// Creates a grid with the given dimensions, both of which must be non-zero.
    pub fn try_new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "pixel grid must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// A one-dimensional strip of `len` pixels.
    pub fn strip(len: u32) -> Result<Self> {
        Self::try_new(len, 1)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Always `false` for a constructed grid; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `index` addresses a pixel of this grid.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index < self.len()
    }

    /// Flat index of pixel `(x, y)`, or `None` when outside the grid.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Pixel coordinates of a flat index. The index must be inside the grid.
    #[inline]
    pub fn coords(&self, index: usize) -> UVec2 {
        debug_assert!(self.contains(index), "pixel index out of range");
        let w = self.width as usize;
        UVec2::new((index % w) as u32, (index / w) as u32)
    }

    /// Flat index of the pixel displaced from `index` by `delta`. No wraparound.
    #[inline]
    pub fn offset(&self, index: usize, delta: IVec2) -> Option<usize> {
        let p = self.coords(index).as_ivec2() + delta;
        self.index(p.x, p.y)
    }

    /// Center of a pixel in pixel units, with the grid origin at the lower-left corner.
    pub fn pixel_center(&self, index: usize) -> Vector2<f32> {
        let c = self.coords(index);
        Vector2 {
            x: c.x as f32 + 0.5,
            y: c.y as f32 + 0.5,
        }
    }

    /// Checks that a per-pixel array matches this grid.
    pub(crate) fn check_len(&self, what: &str, len: usize) -> Result<()> {
        if len != self.len() {
            return Err(Error::InvalidConfig(format!(
                "{what} has {len} entries but the grid has {} pixels",
                self.len()
            )));
        }
        Ok(())
    }
}
