//! Rendering catalogs into counts maps.
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::events::{EventSink, SimEvent, SimEventKind};
use crate::grid::PixelGrid;
use crate::render::kernel::ResponseKernel;
use crate::render::map::{CountsMap, IntensityMap};
use crate::sampling::sample_poisson;

/// How the stochastic step of rendering is carried out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RenderMode {
    /// Accumulate the expected intensity map, then draw one Poisson variate per pixel.
    #[default]
    PixelPoisson,
    /// Draw a Poisson photon count per source and scatter each photon through the kernel.
    ///
    /// Produces the same distribution of maps as [`RenderMode::PixelPoisson`] but works at
    /// the level of individual photons.
    PhotonScatter,
}

/// Optional instrument and background inputs for rendering.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderConfig {
    /// Per-pixel exposure converting source flux at the host pixel into expected counts.
    /// `None` means unit exposure everywhere.
    pub exposure: Option<Vec<f64>>,
    /// Smooth expected counts added to every map, e.g. a diffuse emission template.
    pub background: Option<Vec<f64>>,
    /// Stochastic rendering mode.
    pub mode: RenderMode,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-pixel exposure map.
    pub fn with_exposure(mut self, exposure: Vec<f64>) -> Self {
        self.exposure = Some(exposure);
        self
    }

    /// Sets the diffuse background in expected counts per pixel.
    pub fn with_background(mut self, background: Vec<f64>) -> Self {
        self.background = Some(background);
        self
    }

    /// Sets the rendering mode.
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validates the configuration against `grid`, returning an error if invalid.
    pub fn validate(&self, grid: &PixelGrid) -> Result<()> {
        for (name, values) in [
            ("exposure", &self.exposure),
            ("background", &self.background),
        ] {
            let Some(values) = values else { continue };
            grid.check_len(name, values.len())?;
            if let Some((i, v)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(Error::InvalidConfig(format!(
                    "{name} at pixel {i} must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Renders catalogs onto a fixed grid with a fixed response kernel.
#[derive(Debug, Clone)]
pub struct MapRenderer<'a> {
    grid: PixelGrid,
    kernel: &'a ResponseKernel,
    config: RenderConfig,
}

impl<'a> MapRenderer<'a> {
    pub fn try_new(
        grid: PixelGrid,
        kernel: &'a ResponseKernel,
        config: RenderConfig,
    ) -> Result<Self> {
        config.validate(&grid)?;
        Ok(Self {
            grid,
            kernel,
            config,
        })
    }

    pub fn grid(&self) -> PixelGrid {
        self.grid
    }

    pub fn kernel(&self) -> &ResponseKernel {
        self.kernel
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn check_catalog(&self, catalog: &Catalog) -> Result<()> {
        for (i, source) in catalog.iter().enumerate() {
            if !self.grid.contains(source.pixel()) {
                return Err(Error::InvalidConfig(format!(
                    "source {i} sits at pixel {} outside a grid of {} pixels",
                    source.pixel(),
                    self.grid.len()
                )));
            }
            if !source.flux().is_finite() || source.flux() < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "source {i} has invalid flux {}",
                    source.flux()
                )));
            }
        }
        Ok(())
    }

    /// Expected counts contributed by a source at its host pixel.
    #[inline]
    fn amplitude(&self, pixel: usize, flux: f64) -> f64 {
        match &self.config.exposure {
            Some(exposure) => flux * exposure[pixel],
            None => flux,
        }
    }

    /// Deterministic expected-count map: background plus every source spread by the kernel.
    ///
    /// Kernel cells that fall off the grid are dropped, so sources near the edge contribute
    /// only their in-bounds fraction.
    pub fn render_intensity(&self, catalog: &Catalog) -> Result<IntensityMap> {
        self.check_catalog(catalog)?;
        Ok(self.accumulate_intensity(catalog))
    }

    /// Expects a catalog that already passed `check_catalog`.
    fn accumulate_intensity(&self, catalog: &Catalog) -> IntensityMap {
        let mut map = IntensityMap::zeros(self.grid);
        if let Some(background) = &self.config.background {
            for (pixel, &b) in background.iter().enumerate() {
                map.add(pixel, b);
            }
        }

        for source in catalog {
            let amplitude = self.amplitude(source.pixel(), source.flux());
            if amplitude == 0.0 {
                continue;
            }
            for (offset, weight) in self.kernel.footprint() {
                if let Some(target) = self.grid.offset(source.pixel(), offset) {
                    map.add(target, amplitude * weight);
                }
            }
        }

        debug!(
            "Intensity map: {} sources | expected total {:.4}.",
            catalog.len(),
            map.total()
        );
        map
    }

    /// Renders one counts map.
    pub fn render<R: RngCore>(&self, catalog: &Catalog, rng: &mut R) -> Result<CountsMap> {
        self.render_with_events(catalog, rng, &mut ())
    }

    /// Renders one counts map, reporting progress to `sink`.
    pub fn render_with_events<R: RngCore>(
        &self,
        catalog: &Catalog,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> Result<CountsMap> {
        self.check_catalog(catalog)?;
        if sink.wants(SimEventKind::RenderStarted) {
            sink.send(SimEvent::RenderStarted {
                sources: catalog.len(),
                pixels: self.grid.len(),
                mode: self.config.mode,
            });
        }

        let (expected_total, counts) = match self.config.mode {
            RenderMode::PixelPoisson => {
                let intensity = self.accumulate_intensity(catalog);
                (intensity.total(), intensity.realize(rng))
            }
            RenderMode::PhotonScatter => self.scatter_photons(catalog, rng),
        };

        if expected_total == 0.0 && !catalog.is_empty() {
            warn!("Rendered map has zero expected counts; check exposure and fluxes.");
            if sink.wants(SimEventKind::Warning) {
                sink.send(SimEvent::Warning {
                    context: "render".into(),
                    message: "Zero expected counts".into(),
                });
            }
        }
        info!(
            "Map rendered: {} sources | expected {:.2} | observed {} counts.",
            catalog.len(),
            expected_total,
            counts.total()
        );
        if sink.wants(SimEventKind::RenderFinished) {
            sink.send(SimEvent::RenderFinished {
                expected_total,
                observed_total: counts.total(),
            });
        }
        Ok(counts)
    }

    /// Expects a catalog that already passed `check_catalog`.
    fn scatter_photons<R: RngCore>(&self, catalog: &Catalog, rng: &mut R) -> (f64, CountsMap) {
        let mut counts = CountsMap::zeros(self.grid);
        let mut expected_total = 0.0;

        if let Some(background) = &self.config.background {
            for (pixel, &b) in background.iter().enumerate() {
                expected_total += b;
                counts.add(pixel, sample_poisson(b, rng));
            }
        }

        for source in catalog {
            let host = source.pixel();
            let amplitude = self.amplitude(host, source.flux());
            if amplitude == 0.0 {
                continue;
            }
            let in_bounds: f64 = self
                .kernel
                .footprint()
                .filter(|(offset, _)| self.grid.offset(host, *offset).is_some())
                .map(|(_, w)| w)
                .sum();
            expected_total += amplitude * in_bounds;

            let photons = sample_poisson(amplitude, rng);
            for _ in 0..photons {
                let offset = self.kernel.sample_offset(rng);
                if let Some(target) = self.grid.offset(host, offset) {
                    counts.add(target, 1);
                }
            }
        }

        (expected_total, counts)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::catalog::Source;
    use crate::events::VecSink;

    fn catalog(sources: &[(usize, f64)]) -> Catalog {
        Catalog::from_sources(sources.iter().map(|&(p, f)| Source::new(p, f)).collect()).unwrap()
    }

    #[test]
    fn config_validation_checks_lengths_and_values() {
        let grid = PixelGrid::try_new(2, 2).unwrap();
        assert!(RenderConfig::new().validate(&grid).is_ok());
        assert!(RenderConfig::new()
            .with_exposure(vec![1.0; 3])
            .validate(&grid)
            .is_err());
        assert!(RenderConfig::new()
            .with_background(vec![0.0, 1.0, f64::NAN, 0.0])
            .validate(&grid)
            .is_err());
        assert!(RenderConfig::new()
            .with_exposure(vec![1.0, -1.0, 1.0, 1.0])
            .validate(&grid)
            .is_err());
    }

    #[test]
    fn delta_kernel_places_flux_in_host_pixel_exactly() {
        let grid = PixelGrid::try_new(5, 2).unwrap();
        let kernel = ResponseKernel::delta();
        let renderer = MapRenderer::try_new(grid, &kernel, RenderConfig::new()).unwrap();
        let cat = catalog(&[(0, 1.25), (3, 7.0), (9, 0.1)]);

        let map = renderer.render_intensity(&cat).unwrap();
        let mut expected = vec![0.0; 10];
        expected[0] = 1.25;
        expected[3] = 7.0;
        expected[9] = 0.1;
        assert_eq!(map.values(), expected.as_slice());
    }

    #[test]
    fn interior_sources_conserve_flux() {
        let grid = PixelGrid::try_new(20, 20).unwrap();
        let kernel = ResponseKernel::gaussian(1.2, 3).unwrap();
        let renderer = MapRenderer::try_new(grid, &kernel, RenderConfig::new()).unwrap();
        let center = grid.index(10, 10).unwrap();
        let other = grid.index(6, 12).unwrap();
        let cat = catalog(&[(center, 3.0), (other, 5.5)]);

        let map = renderer.render_intensity(&cat).unwrap();
        assert!((map.total() - cat.total_flux()).abs() < 1e-9);
    }

    #[test]
    fn edge_sources_are_truncated_without_wraparound() {
        let grid = PixelGrid::try_new(3, 1).unwrap();
        let kernel = ResponseKernel::from_weights(3, 1, vec![1.0, 2.0, 1.0]).unwrap();
        let renderer = MapRenderer::try_new(grid, &kernel, RenderConfig::new()).unwrap();
        let cat = catalog(&[(0, 4.0)]);

        let map = renderer.render_intensity(&cat).unwrap();
        assert_eq!(map.values(), &[2.0, 1.0, 0.0]);
        assert_eq!(map.total(), 3.0);
    }

    #[test]
    fn exposure_and_background_enter_the_intensity() {
        let grid = PixelGrid::strip(3).unwrap();
        let kernel = ResponseKernel::delta();
        let config = RenderConfig::new()
            .with_exposure(vec![2.0, 0.5, 1.0])
            .with_background(vec![0.25, 0.25, 0.25]);
        let renderer = MapRenderer::try_new(grid, &kernel, config).unwrap();
        let cat = catalog(&[(0, 1.0), (1, 4.0)]);

        let map = renderer.render_intensity(&cat).unwrap();
        assert_eq!(map.values(), &[2.25, 2.25, 0.25]);
    }

    #[test]
    fn rejects_sources_outside_the_grid() {
        let grid = PixelGrid::strip(3).unwrap();
        let kernel = ResponseKernel::delta();
        let renderer = MapRenderer::try_new(grid, &kernel, RenderConfig::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(renderer.render(&catalog(&[(3, 1.0)]), &mut rng).is_err());
    }

    #[test]
    fn invalid_catalog_emits_no_events() {
        let grid = PixelGrid::strip(3).unwrap();
        let kernel = ResponseKernel::delta();
        let bad = catalog(&[(0, 1.0), (5, 2.0)]);
        for mode in [RenderMode::PixelPoisson, RenderMode::PhotonScatter] {
            let renderer =
                MapRenderer::try_new(grid, &kernel, RenderConfig::new().with_mode(mode)).unwrap();
            let mut rng = StdRng::seed_from_u64(9);
            let mut sink = VecSink::new();
            assert!(renderer
                .render_with_events(&bad, &mut rng, &mut sink)
                .is_err());
            assert!(sink.is_empty(), "{mode:?} left {} events", sink.len());
        }
    }

    #[test]
    fn pixel_poisson_totals_track_catalog_flux() {
        let grid = PixelGrid::try_new(30, 30).unwrap();
        let kernel = ResponseKernel::gaussian(1.0, 2).unwrap();
        let renderer = MapRenderer::try_new(grid, &kernel, RenderConfig::new()).unwrap();
        let sources: Vec<(usize, f64)> = (0..100)
            .map(|i| (grid.index(5 + (i % 20), 5 + (i / 20) * 4).unwrap(), 50.0))
            .collect();
        let cat = catalog(&sources);

        let mut rng = StdRng::seed_from_u64(31);
        let counts = renderer.render(&cat, &mut rng).unwrap();
        // Poisson(5000): standard deviation about 71.
        let total = counts.total() as f64;
        assert!((total - 5_000.0).abs() < 400.0, "total {total}");
    }

    #[test]
    fn photon_scatter_matches_pixel_poisson_in_expectation() {
        let grid = PixelGrid::try_new(9, 9).unwrap();
        let kernel = ResponseKernel::from_weights(3, 3, vec![1.0; 9]).unwrap();
        let host = grid.index(4, 4).unwrap();
        let cat = catalog(&[(host, 900.0)]);
        let renderer = MapRenderer::try_new(
            grid,
            &kernel,
            RenderConfig::new().with_mode(RenderMode::PhotonScatter),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(64);
        let mut sink = VecSink::new();
        let counts = renderer.render_with_events(&cat, &mut rng, &mut sink).unwrap();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let p = grid.index(4 + dx, 4 + dy).unwrap();
                let c = counts.get(p) as f64;
                // Each of the nine cells expects 100 counts.
                assert!((c - 100.0).abs() < 50.0, "pixel ({dx}, {dy}) has {c}");
            }
        }
        assert_eq!(counts.get(0), 0);
        let expected = sink
            .as_slice()
            .iter()
            .find_map(|e| match e {
                SimEvent::RenderFinished { expected_total, .. } => Some(*expected_total),
                _ => None,
            })
            .expect("render finished event");
        assert!((expected - 900.0).abs() < 1e-9);
    }

    #[test]
    fn photon_scatter_drops_off_grid_photons() {
        let grid = PixelGrid::strip(1).unwrap();
        let kernel = ResponseKernel::from_weights(3, 1, vec![1.0, 0.0, 1.0]).unwrap();
        let renderer = MapRenderer::try_new(
            grid,
            &kernel,
            RenderConfig::new().with_mode(RenderMode::PhotonScatter),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let counts = renderer.render(&catalog(&[(0, 50.0)]), &mut rng).unwrap();
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn same_seed_same_map() {
        let grid = PixelGrid::try_new(8, 8).unwrap();
        let kernel = ResponseKernel::gaussian(0.8, 1).unwrap();
        let cat = catalog(&[(10, 12.0), (40, 3.0), (63, 8.0)]);
        for mode in [RenderMode::PixelPoisson, RenderMode::PhotonScatter] {
            let renderer =
                MapRenderer::try_new(grid, &kernel, RenderConfig::new().with_mode(mode)).unwrap();
            let a = renderer.render(&cat, &mut StdRng::seed_from_u64(5)).unwrap();
            let b = renderer.render(&cat, &mut StdRng::seed_from_u64(5)).unwrap();
            assert_eq!(a, b);
        }
    }
}
