use rand::rngs::StdRng;
use rand::SeedableRng;
use sky_sim::prelude::*;
use sky_sim_examples::{init_tracing, write_counts_png, ImageConfig, Stretch};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // dN/dS = 100 S^-2 on [1, 10], proposed from an identical envelope.
    let dist = PowerLaw::try_new(100.0, 2.0)?;
    let envelope = PowerLawEnvelope::try_new(100.0, 2.0)?;
    let grid = PixelGrid::strip(10)?;
    let template = SpatialTemplate::uniform(grid.len())?;

    let config = CatalogConfig::new(1.0, 10.0, CountPolicy::Fixed(50));
    let builder = CatalogBuilder::try_new(config, &dist, &envelope, &template)?;

    let mut rng = StdRng::seed_from_u64(2025);
    let report = builder.build(&mut rng)?;
    let catalog = &report.catalog;

    // Steep counts: most sources sit near the faint end.
    let mut histogram = [0usize; 9];
    for flux in catalog.fluxes() {
        let bin = ((flux - 1.0) as usize).min(histogram.len() - 1);
        histogram[bin] += 1;
    }
    for (i, n) in histogram.iter().enumerate() {
        println!("S in [{}, {}): {}", i + 1, i + 2, "#".repeat(*n));
    }
    println!(
        "flux acceptance {:.3} over {} proposals",
        report.flux_stats.acceptance_rate().unwrap_or(0.0),
        report.flux_stats.attempts
    );

    let kernel = ResponseKernel::delta();
    let expected = render_intensity(catalog, grid, &kernel)?;
    let counts = render(catalog, grid, &kernel, &mut rng)?;
    println!(
        "total flux {:.2} | expected counts {:.2} | observed counts {}",
        catalog.total_flux(),
        expected.total(),
        counts.total()
    );

    let image = ImageConfig::new().with_scale(32).with_stretch(Stretch::Linear);
    write_counts_png(&counts, &image, "catalog-power-law-basic.png")?;
    Ok(())
}
