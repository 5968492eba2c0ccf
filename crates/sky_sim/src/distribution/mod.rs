//! Source population models: number counts, proposal envelopes, and spatial templates.
//!
//! - Implement [`NumberCount`] for a custom dN/dS, or wrap a closure with [`FnNumberCount`].
//! - Pick an [`Envelope`] that dominates the number count over the sampled flux range.
//! - Describe where sources live with a [`SpatialTemplate`].
pub mod envelope;
pub mod number_count;
pub mod template;

pub use envelope::{Envelope, PowerLawEnvelope, UniformEnvelope};
pub use number_count::{BrokenPowerLaw, PowerLaw};
pub use template::SpatialTemplate;

/// Number of log-spaced flux points used to probe distributions during validation.
pub const PROBE_POINTS: usize = 1024;

/// Number of Simpson intervals used by the default [`NumberCount::integral`].
pub const DEFAULT_INTEGRATION_STEPS: usize = 2048;

/// Differential source counts dN/dS as a function of flux.
///
/// Values must be finite and non-negative over the sampled range. Implementations with a
/// closed-form integral should override [`NumberCount::integral`].
pub trait NumberCount: Send + Sync {
    /// Differential count density at `flux`.
    fn density(&self, flux: f64) -> f64;

    /// Expected number of sources with flux in `[lo, hi]`.
    ///
    /// The default integrates numerically in log-flux with the composite Simpson rule.
    fn integral(&self, lo: f64, hi: f64) -> f64 {
        log_simpson(|s| self.density(s), lo, hi, DEFAULT_INTEGRATION_STEPS)
    }
}

impl<T: NumberCount + ?Sized> NumberCount for &T {
    fn density(&self, flux: f64) -> f64 {
        (**self).density(flux)
    }

    fn integral(&self, lo: f64, hi: f64) -> f64 {
        (**self).integral(lo, hi)
    }
}

impl<T: NumberCount + ?Sized> NumberCount for Box<T> {
    fn density(&self, flux: f64) -> f64 {
        (**self).density(flux)
    }

    fn integral(&self, lo: f64, hi: f64) -> f64 {
        (**self).integral(lo, hi)
    }
}

/// A [`NumberCount`] backed by a closure.
#[derive(Clone)]
pub struct FnNumberCount<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    f: F,
}

impl<F> FnNumberCount<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> NumberCount for FnNumberCount<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    #[inline]
    fn density(&self, flux: f64) -> f64 {
        (self.f)(flux)
    }
}

impl<F> std::fmt::Debug for FnNumberCount<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnNumberCount").finish_non_exhaustive()
    }
}

/// `n` log-spaced points covering `[lo, hi]` inclusive. Requires `0 < lo <= hi` and `n >= 2`.
pub(crate) fn log_grid(lo: f64, hi: f64, n: usize) -> impl Iterator<Item = f64> {
    debug_assert!(lo > 0.0 && hi >= lo && n >= 2);
    let (ln_lo, ln_hi) = (lo.ln(), hi.ln());
    let step = (ln_hi - ln_lo) / (n - 1) as f64;
    (0..n).map(move |i| {
        if i == 0 {
            lo
        } else if i == n - 1 {
            hi
        } else {
            (ln_lo + step * i as f64).exp()
        }
    })
}

/// Composite Simpson integration of `f` over `[lo, hi]` in the variable `t = ln(s)`.
pub(crate) fn log_simpson<F: Fn(f64) -> f64>(f: F, lo: f64, hi: f64, steps: usize) -> f64 {
    let valid = lo > 0.0 && hi > lo && hi.is_finite();
    if !valid {
        return 0.0;
    }
    let steps = (steps.max(2) + 1) & !1;
    let (t0, t1) = (lo.ln(), hi.ln());
    let h = (t1 - t0) / steps as f64;
    let g = |t: f64| {
        let s = t.exp();
        f(s) * s
    };

    let mut sum = g(t0) + g(t1);
    for i in 1..steps {
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * g(t0 + h * i as f64);
    }
    sum * h / 3.0
}
