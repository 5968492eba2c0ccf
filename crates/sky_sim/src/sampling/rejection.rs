//! Rejection sampling of fluxes from a number count and of pixels from a template.
//!
//! The flux sampler proposes from an [`Envelope`] restricted to `[flux_min, flux_max]`,
//! draws `u` uniformly under the envelope height, and accepts when `u` falls at or below the
//! target density. The envelope must dominate the target; a violated envelope silently
//! biases the samples (counted in [`RejectionStats::domination_violations`]).
use rand::RngCore;
use tracing::debug;

use crate::distribution::{log_grid, Envelope, NumberCount, SpatialTemplate, PROBE_POINTS};
use crate::error::{Error, Result};
use crate::sampling::{rand01, RejectionStats};

/// Checks `0 < flux_min < flux_max < inf`.
pub(crate) fn check_flux_range(flux_min: f64, flux_max: f64) -> Result<()> {
    if !flux_min.is_finite() || !flux_max.is_finite() {
        return Err(Error::InvalidConfig(format!(
            "flux bounds must be finite, got [{flux_min}, {flux_max}]"
        )));
    }
    if flux_min <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "flux_min must be > 0, got {flux_min}"
        )));
    }
    if flux_max <= flux_min {
        return Err(Error::InvalidConfig(format!(
            "flux_max must exceed flux_min, got [{flux_min}, {flux_max}]"
        )));
    }
    Ok(())
}

/// Draw one flux from `distribution` using `envelope` as proposal.
///
/// Fails with [`Error::InvalidConfig`] when the bounds do not satisfy
/// `0 < flux_min < flux_max < inf`. Otherwise loops until a candidate is accepted; if
/// `distribution` is zero everywhere on the range this never returns, so use
/// [`FluxSampler`] to validate the densities as well.
pub fn sample_flux<D, E, R>(
    distribution: &D,
    envelope: &E,
    flux_min: f64,
    flux_max: f64,
    rng: &mut R,
) -> Result<f64>
where
    D: NumberCount + ?Sized,
    E: Envelope + ?Sized,
    R: RngCore,
{
    let mut stats = RejectionStats::default();
    sample_flux_with_stats(distribution, envelope, flux_min, flux_max, rng, &mut stats)
}

/// Like [`sample_flux`], recording attempts in `stats`.
pub fn sample_flux_with_stats<D, E, R>(
    distribution: &D,
    envelope: &E,
    flux_min: f64,
    flux_max: f64,
    rng: &mut R,
    stats: &mut RejectionStats,
) -> Result<f64>
where
    D: NumberCount + ?Sized,
    E: Envelope + ?Sized,
    R: RngCore,
{
    check_flux_range(flux_min, flux_max)?;
    loop {
        if let Some(flux) = propose_flux(distribution, envelope, flux_min, flux_max, rng, stats) {
            return Ok(flux);
        }
    }
}

/// Draw one pixel index with probability proportional to the template weight.
pub fn sample_position<R: RngCore>(template: &SpatialTemplate, rng: &mut R) -> usize {
    template.table().sample(rng)
}

/// Like [`sample_position`], recording attempts in `stats`.
pub fn sample_position_with_stats<R: RngCore>(
    template: &SpatialTemplate,
    rng: &mut R,
    stats: &mut RejectionStats,
) -> usize {
    template.table().sample_with_stats(rng, stats)
}

#[inline]
fn propose_flux<D, E>(
    distribution: &D,
    envelope: &E,
    flux_min: f64,
    flux_max: f64,
    rng: &mut dyn RngCore,
    stats: &mut RejectionStats,
) -> Option<f64>
where
    D: NumberCount + ?Sized,
    E: Envelope + ?Sized,
{
    let x = envelope.sample(flux_min, flux_max, rng);
    let height = envelope.value(x);
    let target = distribution.density(x);
    stats.attempts += 1;
    if target > height {
        stats.domination_violations += 1;
    }

    let u = rand01(rng) * height;
    if target > 0.0 && u <= target {
        stats.accepted += 1;
        Some(x)
    } else {
        None
    }
}

/// A validated flux sampler bound to a number count, an envelope, and a flux range.
#[derive(Clone, Copy)]
pub struct FluxSampler<'a> {
    distribution: &'a dyn NumberCount,
    envelope: &'a dyn Envelope,
    flux_min: f64,
    flux_max: f64,
    max_attempts: Option<u64>,
}

impl<'a> FluxSampler<'a> {
    /// Validates the inputs before any sampling happens.
    ///
    /// The number count and envelope are probed on a log-spaced grid over the range. Negative
    /// or non-finite values are configuration errors; a number count that is zero at every
    /// probe point is [`Error::EmptySupport`].
    pub fn try_new(
        distribution: &'a dyn NumberCount,
        envelope: &'a dyn Envelope,
        flux_min: f64,
        flux_max: f64,
    ) -> Result<Self> {
        check_flux_range(flux_min, flux_max)?;

        let mut any_positive = false;
        for s in log_grid(flux_min, flux_max, PROBE_POINTS) {
            let d = distribution.density(s);
            if !d.is_finite() || d < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "number count must be finite and >= 0, got {d} at flux {s}"
                )));
            }
            any_positive |= d > 0.0;

            let e = envelope.value(s);
            if !e.is_finite() || e <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "envelope must be finite and > 0, got {e} at flux {s}"
                )));
            }
        }
        if !any_positive {
            return Err(Error::EmptySupport(format!(
                "number count is zero on [{flux_min}, {flux_max}]"
            )));
        }

        Ok(Self {
            distribution,
            envelope,
            flux_min,
            flux_max,
            max_attempts: None,
        })
    }

    /// Caps the proposals per sample; exceeding it fails with [`Error::SamplingExhausted`].
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn flux_range(&self) -> (f64, f64) {
        (self.flux_min, self.flux_max)
    }

    pub fn distribution(&self) -> &'a dyn NumberCount {
        self.distribution
    }

    /// Checks that the envelope lies on or above the number count at every probe point.
    pub fn verify_envelope(&self) -> Result<()> {
        for s in log_grid(self.flux_min, self.flux_max, PROBE_POINTS) {
            let target = self.distribution.density(s);
            let envelope = self.envelope.value(s);
            if target > envelope {
                return Err(Error::EnvelopeViolation {
                    flux: s,
                    target,
                    envelope,
                });
            }
        }
        debug!(
            "Envelope dominates number count on [{}, {}].",
            self.flux_min, self.flux_max
        );
        Ok(())
    }

    /// Expected number of sources over the range, `integral of dN/dS`.
    pub fn expected_count(&self) -> f64 {
        self.distribution.integral(self.flux_min, self.flux_max)
    }

    /// Theoretical acceptance rate: target area over envelope area.
    pub fn expected_acceptance(&self) -> f64 {
        let envelope_area = self.envelope.integral(self.flux_min, self.flux_max);
        if envelope_area > 0.0 {
            self.expected_count() / envelope_area
        } else {
            0.0
        }
    }

    /// Draw one flux.
    pub fn sample<R: RngCore>(&self, rng: &mut R) -> Result<f64> {
        let mut stats = RejectionStats::default();
        self.sample_with_stats(rng, &mut stats)
    }

    /// Draw one flux, recording attempts in `stats`.
    pub fn sample_with_stats<R: RngCore>(
        &self,
        rng: &mut R,
        stats: &mut RejectionStats,
    ) -> Result<f64> {
        let mut attempts: u64 = 0;
        loop {
            if let Some(flux) = propose_flux(
                self.distribution,
                self.envelope,
                self.flux_min,
                self.flux_max,
                rng,
                stats,
            ) {
                return Ok(flux);
            }
            attempts += 1;
            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(Error::SamplingExhausted { attempts });
            }
        }
    }
}

impl std::fmt::Debug for FluxSampler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluxSampler")
            .field("flux_min", &self.flux_min)
            .field("flux_max", &self.flux_max)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::distribution::{FnNumberCount, PowerLaw, PowerLawEnvelope, UniformEnvelope};
    use crate::sampling::testing::SequenceRng;

    #[test]
    fn uniform_target_with_matching_envelope_accepts_everything() {
        let target = FnNumberCount::new(|_| 2.0);
        let envelope = UniformEnvelope::try_new(2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut stats = RejectionStats::default();
        for _ in 0..5_000 {
            let x = sample_flux_with_stats(&target, &envelope, 1.0, 3.0, &mut rng, &mut stats)
                .unwrap();
            assert!((1.0..=3.0).contains(&x));
        }
        let rate = stats.acceptance_rate().unwrap();
        assert!(rate > 0.999, "acceptance rate {rate}");
        assert_eq!(stats.domination_violations, 0);
    }

    #[test]
    fn scripted_rejection_then_acceptance() {
        // Target is 1 below flux 2 and 0 above; envelope is flat at 1 on [1, 3].
        let target = FnNumberCount::new(|s: f64| if s < 2.0 { 1.0 } else { 0.0 });
        let envelope = UniformEnvelope::try_new(1.0).unwrap();
        // First candidate 1 + 0.75 * 2 = 2.5 is rejected (target 0), second 1.5 accepted.
        let mut rng = SequenceRng::new(&[0.75, 0.1, 0.25, 0.9]);
        let mut stats = RejectionStats::default();
        let x =
            sample_flux_with_stats(&target, &envelope, 1.0, 3.0, &mut rng, &mut stats).unwrap();
        assert!((x - 1.5).abs() < 1e-12);
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.accepted, 1);
        assert_eq!(rng.consumed(), 4);
    }

    #[test]
    fn power_law_histogram_matches_analytic_shape() {
        // dN/dS = S^-2.5 on [1, 10], proposed from a flatter S^-1.5 envelope.
        let target = PowerLaw::try_new(1.0, 2.5).unwrap();
        let envelope = PowerLawEnvelope::try_new(1.0, 1.5).unwrap();
        let (lo, hi) = (1.0, 10.0);
        let mut rng = StdRng::seed_from_u64(2024);

        let n = 50_000;
        let edges: Vec<f64> = log_grid(lo, hi, 9).collect();
        let mut counts = vec![0usize; edges.len() - 1];
        for _ in 0..n {
            let x = sample_flux(&target, &envelope, lo, hi, &mut rng).unwrap();
            let bin = edges.partition_point(|e| *e <= x).clamp(1, edges.len() - 1) - 1;
            counts[bin] += 1;
        }

        let total = target.integral(lo, hi);
        let mut chi2 = 0.0;
        for (i, &observed) in counts.iter().enumerate() {
            let expected = n as f64 * target.integral(edges[i], edges[i + 1]) / total;
            chi2 += (observed as f64 - expected).powi(2) / expected;
        }
        // 7 degrees of freedom; 99.9th percentile is about 24.3.
        assert!(chi2 < 24.3, "chi2 {chi2}, counts {counts:?}");
    }

    #[test]
    fn violated_envelope_is_counted() {
        let target = FnNumberCount::new(|_| 3.0);
        let envelope = UniformEnvelope::try_new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let mut stats = RejectionStats::default();
        sample_flux_with_stats(&target, &envelope, 1.0, 2.0, &mut rng, &mut stats).unwrap();
        assert!(stats.domination_violations > 0);
    }

    #[test]
    fn sample_flux_rejects_bad_bounds_before_drawing() {
        let target = PowerLaw::try_new(1.0, 2.0).unwrap();
        let flat = UniformEnvelope::try_new(1.0).unwrap();
        let steep = PowerLawEnvelope::try_new(1.0, 2.0).unwrap();
        let mut rng = SequenceRng::new(&[0.5]);

        for (lo, hi) in [
            (10.0, 1.0),
            (f64::NAN, 10.0),
            (1.0, f64::NAN),
            (-1.0, 10.0),
            (0.0, 10.0),
            (1.0, f64::INFINITY),
        ] {
            assert!(
                matches!(
                    sample_flux(&target, &flat, lo, hi, &mut rng),
                    Err(Error::InvalidConfig(_))
                ),
                "[{lo}, {hi}] accepted with flat envelope"
            );
            assert!(
                matches!(
                    sample_flux(&target, &steep, lo, hi, &mut rng),
                    Err(Error::InvalidConfig(_))
                ),
                "[{lo}, {hi}] accepted with power-law envelope"
            );
        }
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn single_pixel_template_always_returns_that_pixel() {
        let template = SpatialTemplate::try_new([0.0, 0.0, 7.5, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            assert_eq!(sample_position(&template, &mut rng), 2);
        }
    }

    #[test]
    fn concentrated_template_region_frequency() {
        // Pixels 0..5 carry 80% of the weight, pixels 5..10 the rest.
        let mut weights = vec![0.8 / 5.0; 5];
        weights.extend(vec![0.2 / 5.0; 5]);
        let template = SpatialTemplate::try_new(weights).unwrap();
        let mut rng = StdRng::seed_from_u64(77);
        let n = 40_000;
        let inside = (0..n)
            .filter(|_| sample_position(&template, &mut rng) < 5)
            .count();
        let frac = inside as f64 / n as f64;
        assert!((frac - 0.8).abs() < 0.015, "fraction {frac}");
    }

    #[test]
    fn flux_sampler_validates_inputs() {
        let target = PowerLaw::try_new(1.0, 2.0).unwrap();
        let envelope = PowerLawEnvelope::try_new(1.0, 2.0).unwrap();
        assert!(FluxSampler::try_new(&target, &envelope, -1.0, 10.0).is_err());
        assert!(FluxSampler::try_new(&target, &envelope, 0.0, 10.0).is_err());
        assert!(FluxSampler::try_new(&target, &envelope, 5.0, 5.0).is_err());
        assert!(FluxSampler::try_new(&target, &envelope, 1.0, f64::INFINITY).is_err());
        assert!(FluxSampler::try_new(&target, &envelope, f64::NAN, 10.0).is_err());

        let zero = FnNumberCount::new(|_| 0.0);
        assert!(matches!(
            FluxSampler::try_new(&zero, &envelope, 1.0, 10.0),
            Err(Error::EmptySupport(_))
        ));

        let nan = FnNumberCount::new(|s: f64| if s > 5.0 { f64::NAN } else { 1.0 });
        assert!(matches!(
            FluxSampler::try_new(&nan, &envelope, 1.0, 10.0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn verify_envelope_reports_violation() {
        let target = PowerLaw::try_new(2.0, 2.0).unwrap();
        let envelope = PowerLawEnvelope::try_new(1.0, 2.0).unwrap();
        let sampler = FluxSampler::try_new(&target, &envelope, 1.0, 10.0).unwrap();
        assert!(matches!(
            sampler.verify_envelope(),
            Err(Error::EnvelopeViolation { .. })
        ));

        let good = PowerLawEnvelope::try_new(2.0, 2.0).unwrap();
        let sampler = FluxSampler::try_new(&target, &good, 1.0, 10.0).unwrap();
        assert!(sampler.verify_envelope().is_ok());
        assert!((sampler.expected_acceptance() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn max_attempts_turns_stalls_into_errors() {
        // Support only on a sliver the probe catches but the envelope rarely proposes.
        let target = FnNumberCount::new(|s: f64| if s > 9.999 { 1.0 } else { 0.0 });
        let envelope = UniformEnvelope::try_new(1.0).unwrap();
        let sampler = FluxSampler::try_new(&target, &envelope, 1.0, 10.0)
            .unwrap()
            .with_max_attempts(Some(3));
        let mut rng = SequenceRng::new(&[0.1, 0.5]);
        assert!(matches!(
            sampler.sample(&mut rng),
            Err(Error::SamplingExhausted { attempts: 3 })
        ));
    }
}
