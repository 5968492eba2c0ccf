use rand::rngs::StdRng;
use rand::SeedableRng;
use sky_sim::prelude::*;
use sky_sim_examples::{init_tracing, write_counts_png, write_intensity_png, ImageConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let grid = PixelGrid::try_new(128, 128)?;

    // Sources concentrated in a band across the middle of the map.
    let weights: Vec<f64> = (0..grid.len())
        .map(|i| {
            let y = grid.pixel_center(i).y as f64 - 64.0;
            (-y * y / (2.0 * 12.0 * 12.0)).exp()
        })
        .collect();
    let template = SpatialTemplate::for_grid(&grid, weights)?;

    // Faint population with a break at 30 counts.
    let dist = BrokenPowerLaw::try_new(6.0, vec![30.0], vec![1.5, 2.5])?;
    let envelope = PowerLawEnvelope::fitted(&dist, 2.0, 2_000.0, 1.5, 1.05)?;
    let config = CatalogConfig::new(2.0, 2_000.0, CountPolicy::Poisson).with_verify_envelope(true);
    let builder = CatalogBuilder::try_new(config, &dist, &envelope, &template)?;

    let mut rng = StdRng::seed_from_u64(7);
    let report = builder.build(&mut rng)?;
    println!(
        "expected {:.1} sources, drew {}",
        report.expected_count.unwrap_or(0.0),
        report.catalog.len()
    );

    let kernel = ResponseKernel::gaussian(1.8, 6)?;
    let diffuse = vec![0.05; grid.len()];
    let renderer = MapRenderer::try_new(
        grid,
        &kernel,
        RenderConfig::new().with_background(diffuse),
    )?;

    let intensity = renderer.render_intensity(&report.catalog)?;
    let counts = renderer.render(&report.catalog, &mut rng)?;

    let image = ImageConfig::new().with_scale(6);
    write_intensity_png(&intensity, &image, "maps-gaussian-psf-expected.png")?;
    write_counts_png(&counts, &image, "maps-gaussian-psf-counts.png")?;
    Ok(())
}
