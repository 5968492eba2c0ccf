use sky_sim::prelude::*;
use sky_sim_examples::{init_tracing, write_counts_png, ImageConfig, Stretch};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let grid = PixelGrid::try_new(64, 64)?;
    let template = SpatialTemplate::uniform(grid.len())?;

    // Closure-defined counts with an exponential cutoff, under a plain power-law envelope.
    let dist = FnNumberCount::new(|s: f64| 80.0 * s.powf(-1.8) * (-s / 200.0).exp());
    let envelope = PowerLawEnvelope::try_new(80.0, 1.8)?;
    let config = CatalogConfig::new(1.0, 1_000.0, CountPolicy::Poisson);
    let builder = CatalogBuilder::try_new(config, &dist, &envelope, &template)?;

    let kernel = ResponseKernel::gaussian(1.2, 4)?;
    let renderer = MapRenderer::try_new(grid, &kernel, RenderConfig::new())?;

    let runs = generate_realizations(&builder, &renderer, 0x5EED, 32)?;

    let sizes: Vec<f64> = runs.iter().map(|r| r.catalog.len() as f64).collect();
    let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
    let var = sizes.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / (sizes.len() - 1) as f64;
    println!(
        "expected {:.1} sources per sky | sample mean {:.1} | sample variance {:.1}",
        builder.expected_count(),
        mean,
        var
    );

    let image = ImageConfig::new().with_scale(6).with_stretch(Stretch::Log);
    for run in runs.iter().take(4) {
        write_counts_png(
            &run.counts,
            &image,
            format!("realizations-parallel-{}.png", run.index),
        )?;
    }
    Ok(())
}
