//! Proposal envelopes for flux rejection sampling.
//!
//! An envelope is an easily sampled density scaled so that it lies on or above the target
//! number count over the sampled range. Domination is the caller's responsibility;
//! [`PowerLawEnvelope::fitted`] offers a probe-based fit for convenience.
use rand::RngCore;

use crate::distribution::{log_grid, NumberCount, PROBE_POINTS};
use crate::error::{Error, Result};
use crate::sampling::rand01;

/// Proposal distribution over flux.
pub trait Envelope: Send + Sync {
    /// Envelope height at `flux`, including its scale.
    fn value(&self, flux: f64) -> f64;

    /// Draw a flux from the envelope's shape restricted to `[lo, hi]`.
    fn sample(&self, lo: f64, hi: f64, rng: &mut dyn RngCore) -> f64;

    /// Area under the envelope over `[lo, hi]`.
    fn integral(&self, lo: f64, hi: f64) -> f64;
}

impl<T: Envelope + ?Sized> Envelope for &T {
    fn value(&self, flux: f64) -> f64 {
        (**self).value(flux)
    }

    fn sample(&self, lo: f64, hi: f64, rng: &mut dyn RngCore) -> f64 {
        (**self).sample(lo, hi, rng)
    }

    fn integral(&self, lo: f64, hi: f64) -> f64 {
        (**self).integral(lo, hi)
    }
}

/// Envelope `scale * S^-index`, sampled by inverting its CDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawEnvelope {
    pub scale: f64,
    pub index: f64,
}

impl PowerLawEnvelope {
    pub fn try_new(scale: f64, index: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "envelope scale must be finite and > 0, got {scale}"
            )));
        }
        if !index.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "envelope index must be finite, got {index}"
            )));
        }
        Ok(Self { scale, index })
    }

    /// Fits the scale so the envelope dominates `target` on a log-spaced probe of `[lo, hi]`.
    ///
    /// The largest probed ratio `target / S^-index` is multiplied by `margin` (>= 1). Narrow
    /// features between probe points can still poke above the envelope; raise `margin`
    /// when the target is not smooth.
    pub fn fitted<D: NumberCount + ?Sized>(
        target: &D,
        lo: f64,
        hi: f64,
        index: f64,
        margin: f64,
    ) -> Result<Self> {
        let valid = lo > 0.0 && hi > lo && hi.is_finite();
        if !valid {
            return Err(Error::InvalidConfig(format!(
                "flux range must satisfy 0 < lo < hi < inf, got [{lo}, {hi}]"
            )));
        }
        if !margin.is_finite() || margin < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "envelope margin must be >= 1, got {margin}"
            )));
        }

        let mut ratio: f64 = 0.0;
        for s in log_grid(lo, hi, PROBE_POINTS) {
            let d = target.density(s);
            if !d.is_finite() || d < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "number count must be finite and >= 0, got {d} at flux {s}"
                )));
            }
            ratio = ratio.max(d / s.powf(-index));
        }
        if ratio <= 0.0 {
            return Err(Error::EmptySupport(format!(
                "number count is zero on [{lo}, {hi}]"
            )));
        }
        Self::try_new(ratio * margin, index)
    }
}

impl Envelope for PowerLawEnvelope {
    #[inline]
    fn value(&self, flux: f64) -> f64 {
        self.scale * flux.powf(-self.index)
    }

    fn sample(&self, lo: f64, hi: f64, rng: &mut dyn RngCore) -> f64 {
        let u = rand01(rng);
        let p = 1.0 - self.index;
        let x = if p.abs() < 1e-12 {
            lo * (hi / lo).powf(u)
        } else {
            let a = lo.powf(p);
            let b = hi.powf(p);
            (a + u * (b - a)).powf(1.0 / p)
        };
        x.clamp(lo, hi)
    }

    fn integral(&self, lo: f64, hi: f64) -> f64 {
        let p = 1.0 - self.index;
        if p.abs() < 1e-12 {
            self.scale * (hi / lo).ln()
        } else {
            self.scale * (hi.powf(p) - lo.powf(p)) / p
        }
    }
}

/// Flat envelope of constant height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformEnvelope {
    pub height: f64,
}

impl UniformEnvelope {
    pub fn try_new(height: f64) -> Result<Self> {
        if !height.is_finite() || height <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "envelope height must be finite and > 0, got {height}"
            )));
        }
        Ok(Self { height })
    }
}

impl Envelope for UniformEnvelope {
    #[inline]
    fn value(&self, _flux: f64) -> f64 {
        self.height
    }

    fn sample(&self, lo: f64, hi: f64, rng: &mut dyn RngCore) -> f64 {
        (lo + rand01(rng) * (hi - lo)).clamp(lo, hi)
    }

    fn integral(&self, lo: f64, hi: f64) -> f64 {
        self.height * (hi - lo)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::distribution::{FnNumberCount, PowerLaw};
    use crate::sampling::testing::SequenceRng;

    #[test]
    fn power_law_envelope_inverse_cdf_hits_bounds() {
        let env = PowerLawEnvelope::try_new(1.0, 2.0).unwrap();
        let mut rng = SequenceRng::new(&[0.0]);
        assert!((env.sample(1.0, 10.0, &mut rng) - 1.0).abs() < 1e-12);

        // CDF of S^-2 on [1, 10]: (1 - 1/S) / 0.9, so u = 0.5 maps to S = 1 / 0.55.
        let mut rng = SequenceRng::new(&[0.5]);
        assert!((env.sample(1.0, 10.0, &mut rng) - 1.0 / 0.55).abs() < 1e-9);
    }

    #[test]
    fn power_law_envelope_index_one_is_log_uniform() {
        let env = PowerLawEnvelope::try_new(1.0, 1.0).unwrap();
        let mut rng = SequenceRng::new(&[0.5]);
        assert!((env.sample(1.0, 100.0, &mut rng) - 10.0).abs() < 1e-9);
        assert!((env.integral(1.0, 100.0) - 100.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn samples_stay_in_range() {
        let env = PowerLawEnvelope::try_new(3.0, 2.5).unwrap();
        let flat = UniformEnvelope::try_new(2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let x = env.sample(0.5, 20.0, &mut rng);
            assert!((0.5..=20.0).contains(&x));
            let y = flat.sample(0.5, 20.0, &mut rng);
            assert!((0.5..=20.0).contains(&y));
        }
    }

    #[test]
    fn fitted_envelope_dominates_target() {
        let target = FnNumberCount::new(|s: f64| 4.0 * s.powf(-1.5) * (1.0 + 0.5 * s.sin()));
        let env = PowerLawEnvelope::fitted(&target, 1.0, 30.0, 1.5, 1.1).unwrap();
        for s in log_grid(1.0, 30.0, 500) {
            assert!(env.value(s) >= target.density(s));
        }
    }

    #[test]
    fn fitted_envelope_for_exact_power_law_matches_norm() {
        let target = PowerLaw::try_new(100.0, 2.0).unwrap();
        let env = PowerLawEnvelope::fitted(&target, 1.0, 10.0, 2.0, 1.0).unwrap();
        assert!((env.scale - 100.0).abs() < 1e-9);
    }

    #[test]
    fn fitted_envelope_rejects_zero_target() {
        let target = FnNumberCount::new(|_| 0.0);
        assert!(matches!(
            PowerLawEnvelope::fitted(&target, 1.0, 10.0, 2.0, 1.0),
            Err(Error::EmptySupport(_))
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(PowerLawEnvelope::try_new(0.0, 2.0).is_err());
        assert!(UniformEnvelope::try_new(-1.0).is_err());
        assert!(UniformEnvelope::try_new(f64::NAN).is_err());
    }
}
