use std::path::Path;

use anyhow::{Context, Result};
use glam::UVec2;
use image::{Rgb, RgbImage};
use sky_sim::grid::PixelGrid;
use sky_sim::render::{CountsMap, IntensityMap};
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Brightness mapping from pixel value to display level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stretch {
    Linear,
    #[default]
    Sqrt,
    Log,
}

impl Stretch {
    fn apply(self, value: f64, max: f64) -> f64 {
        if max <= 0.0 || value <= 0.0 {
            return 0.0;
        }
        let t = match self {
            Stretch::Linear => value / max,
            Stretch::Sqrt => (value / max).sqrt(),
            Stretch::Log => (1.0 + value).ln() / (1.0 + max).ln(),
        };
        t.clamp(0.0, 1.0)
    }
}

/// How maps are turned into images.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Output pixels per map pixel along each axis.
    pub scale: u32,
    pub stretch: Stretch,
    /// Color of an empty pixel.
    pub low: [u8; 3],
    /// Color of the brightest pixel.
    pub high: [u8; 3],
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            scale: 4,
            stretch: Stretch::default(),
            low: [8, 8, 20],
            high: [255, 236, 190],
        }
    }
}

impl ImageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn with_stretch(mut self, stretch: Stretch) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn with_colors(mut self, low: [u8; 3], high: [u8; 3]) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    fn image_size(&self, grid: PixelGrid) -> UVec2 {
        UVec2::new(grid.width(), grid.height()) * self.scale.max(1)
    }

    fn color(&self, t: f64) -> Rgb<u8> {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb([
            mix(self.low[0], self.high[0]),
            mix(self.low[1], self.high[1]),
            mix(self.low[2], self.high[2]),
        ])
    }
}

fn write_png(grid: PixelGrid, values: &[f64], config: &ImageConfig, path: &Path) -> Result<()> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let size = config.image_size(grid);
    let scale = config.scale.max(1);
    let img = RgbImage::from_fn(size.x, size.y, |x, y| {
        let pixel = (y / scale) as usize * grid.width() as usize + (x / scale) as usize;
        config.color(config.stretch.apply(values[pixel], max))
    });
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Wrote {} ({}x{}).", path.display(), size.x, size.y);
    Ok(())
}

/// Writes a counts map as a PNG, brightest pixel mapped to `config.high`.
pub fn write_counts_png(
    counts: &CountsMap,
    config: &ImageConfig,
    path: impl AsRef<Path>,
) -> Result<()> {
    let values: Vec<f64> = counts.values().iter().map(|&c| c as f64).collect();
    write_png(counts.grid(), &values, config, path.as_ref())
}

/// Writes an expected-intensity map as a PNG.
pub fn write_intensity_png(
    intensity: &IntensityMap,
    config: &ImageConfig,
    path: impl AsRef<Path>,
) -> Result<()> {
    write_png(intensity.grid(), intensity.values(), config, path.as_ref())
}
