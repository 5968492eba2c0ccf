//! Map rendering: spreading catalog fluxes through a response kernel and adding Poisson noise.
use rand::RngCore;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::grid::PixelGrid;

pub mod kernel;
pub mod map;
pub mod renderer;

pub use kernel::ResponseKernel;
pub use map::{CountsMap, IntensityMap};
pub use renderer::{MapRenderer, RenderConfig, RenderMode};

/// Renders `catalog` onto `grid` with unit exposure, no background and per-pixel Poisson noise.
pub fn render<R: RngCore>(
    catalog: &Catalog,
    grid: PixelGrid,
    kernel: &ResponseKernel,
    rng: &mut R,
) -> Result<CountsMap> {
    MapRenderer::try_new(grid, kernel, RenderConfig::default())?.render(catalog, rng)
}

/// Expected counts map for `catalog` on `grid` with unit exposure and no background.
pub fn render_intensity(
    catalog: &Catalog,
    grid: PixelGrid,
    kernel: &ResponseKernel,
) -> Result<IntensityMap> {
    MapRenderer::try_new(grid, kernel, RenderConfig::default())?.render_intensity(catalog)
}
