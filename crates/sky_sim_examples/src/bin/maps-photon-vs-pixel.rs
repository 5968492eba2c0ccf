use rand::rngs::StdRng;
use rand::SeedableRng;
use sky_sim::prelude::*;
use sky_sim_examples::{init_tracing, write_counts_png, ImageConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let grid = PixelGrid::try_new(96, 96)?;
    let template = SpatialTemplate::uniform(grid.len())?;
    let dist = PowerLaw::try_new(400.0, 2.2)?;
    let envelope = PowerLawEnvelope::try_new(400.0, 2.2)?;
    let config = CatalogConfig::new(1.0, 500.0, CountPolicy::Fixed(300));
    let builder = CatalogBuilder::try_new(config, &dist, &envelope, &template)?;
    let catalog = builder.build(&mut StdRng::seed_from_u64(11))?.catalog;

    // Exposure falls off toward the right edge of the map.
    let exposure: Vec<f64> = (0..grid.len())
        .map(|i| 1.0 - 0.6 * grid.coords(i).x as f64 / grid.width() as f64)
        .collect();
    let kernel = ResponseKernel::gaussian(1.5, 5)?;

    for (mode, name) in [
        (RenderMode::PixelPoisson, "pixel"),
        (RenderMode::PhotonScatter, "photon"),
    ] {
        let renderer = MapRenderer::try_new(
            grid,
            &kernel,
            RenderConfig::new()
                .with_exposure(exposure.clone())
                .with_mode(mode),
        )?;
        let mut sink = VecSink::only(&[SimEventKind::RenderFinished]);
        let counts =
            renderer.render_with_events(&catalog, &mut StdRng::seed_from_u64(99), &mut sink)?;
        if let Some(SimEvent::RenderFinished {
            expected_total,
            observed_total,
        }) = sink.as_slice().first()
        {
            println!("{name}: expected {expected_total:.1}, observed {observed_total}");
        }
        write_counts_png(
            &counts,
            &ImageConfig::new().with_scale(8),
            format!("maps-photon-vs-pixel-{name}.png"),
        )?;
    }
    Ok(())
}
