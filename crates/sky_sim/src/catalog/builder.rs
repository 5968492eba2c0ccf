//! Catalog generation: repeated flux and position draws under a termination policy.
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Source};
use crate::distribution::{Envelope, NumberCount, SpatialTemplate};
use crate::error::{Error, Result};
use crate::events::{EventSink, SimEvent, SimEventKind};
use crate::sampling::{
    sample_poisson, sample_position_with_stats, FluxSampler, RejectionStats,
};

/// Acceptance rate below which a run logs a tuning warning.
pub const LOW_ACCEPTANCE_RATE: f64 = 0.01;

/// How many sources a catalog receives.
///
/// [`CountPolicy::Fixed`] yields the same size on every run. [`CountPolicy::Poisson`] draws
/// the size from a Poisson distribution whose mean is the integral of the number count, so
/// repeated runs produce different sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CountPolicy {
    /// Exactly this many sources.
    Fixed(u64),
    /// A Poisson realization of the expected source count.
    Poisson,
}

/// Configuration for building a catalog.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogConfig {
    /// Lower flux bound of the sampled range.
    pub flux_min: f64,
    /// Upper flux bound of the sampled range.
    pub flux_max: f64,
    /// Termination policy.
    pub policy: CountPolicy,
    /// Multiplier on the number-count integral, e.g. the template's solid angle when dN/dS
    /// is given per unit solid angle.
    pub area_scale: f64,
    /// Probe the envelope for domination before sampling.
    pub verify_envelope: bool,
    /// Optional cap on proposals per flux sample.
    pub max_attempts: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            flux_min: 0.0,
            flux_max: 0.0,
            policy: CountPolicy::Fixed(0),
            area_scale: 1.0,
            verify_envelope: false,
            max_attempts: None,
        }
    }
}

impl CatalogConfig {
    /// Creates a new [`CatalogConfig`] with the specified flux range and policy.
    pub fn new(flux_min: f64, flux_max: f64, policy: CountPolicy) -> Self {
        Self {
            flux_min,
            flux_max,
            policy,
            ..Default::default()
        }
    }

    /// Sets the termination policy.
    pub fn with_policy(mut self, policy: CountPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the multiplier applied to the number-count integral.
    pub fn with_area_scale(mut self, area_scale: f64) -> Self {
        self.area_scale = area_scale;
        self
    }

    /// Enables or disables the envelope domination probe.
    pub fn with_verify_envelope(mut self, verify: bool) -> Self {
        self.verify_envelope = verify;
        self
    }

    /// Sets the per-sample proposal cap.
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.flux_min.is_finite() || !self.flux_max.is_finite() {
            return Err(Error::InvalidConfig("flux bounds must be finite".into()));
        }
        if self.flux_min <= 0.0 {
            return Err(Error::InvalidConfig("flux_min must be > 0".into()));
        }
        if self.flux_max <= self.flux_min {
            return Err(Error::InvalidConfig(
                "flux_max must be > flux_min".into(),
            ));
        }
        if !self.area_scale.is_finite() || self.area_scale <= 0.0 {
            return Err(Error::InvalidConfig("area_scale must be > 0".into()));
        }
        if self.max_attempts == Some(0) {
            return Err(Error::InvalidConfig("max_attempts must be > 0".into()));
        }
        Ok(())
    }
}

/// A finished catalog plus the diagnostics gathered while drawing it.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct CatalogReport {
    /// The generated catalog.
    pub catalog: Catalog,
    /// Flux rejection loop counters.
    pub flux_stats: RejectionStats,
    /// Position rejection loop counters.
    pub position_stats: RejectionStats,
    /// Poisson mean used by [`CountPolicy::Poisson`].
    pub expected_count: Option<f64>,
}

/// Draws catalogs from a number count, an envelope, and a spatial template.
///
/// The builder only borrows its inputs and holds no mutable state, so one builder can serve
/// many independent runs, each with its own random stream.
#[derive(Debug, Clone)]
pub struct CatalogBuilder<'a> {
    config: CatalogConfig,
    sampler: FluxSampler<'a>,
    template: &'a SpatialTemplate,
}

impl<'a> CatalogBuilder<'a> {
    /// Validates the configuration and inputs before any sampling happens.
    pub fn try_new(
        config: CatalogConfig,
        distribution: &'a dyn NumberCount,
        envelope: &'a dyn Envelope,
        template: &'a SpatialTemplate,
    ) -> Result<Self> {
        config.validate()?;
        let sampler = FluxSampler::try_new(distribution, envelope, config.flux_min, config.flux_max)?
            .with_max_attempts(config.max_attempts);
        if config.verify_envelope {
            sampler.verify_envelope()?;
        }
        if config.policy == CountPolicy::Poisson {
            let expected = config.area_scale * sampler.expected_count();
            if !expected.is_finite() || expected < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "expected source count must be finite and >= 0, got {expected}"
                )));
            }
        }
        debug!(
            "Catalog builder ready: flux [{}, {}], theoretical acceptance {:.4}.",
            config.flux_min,
            config.flux_max,
            sampler.expected_acceptance()
        );

        Ok(Self {
            config,
            sampler,
            template,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn template(&self) -> &SpatialTemplate {
        self.template
    }

    /// Expected number of sources implied by the number count over the flux range.
    pub fn expected_count(&self) -> f64 {
        self.config.area_scale * self.sampler.expected_count()
    }

    /// Builds one catalog.
    pub fn build<R: RngCore>(&self, rng: &mut R) -> Result<CatalogReport> {
        self.build_with_events(rng, &mut ())
    }

    /// Builds one catalog, reporting progress to `sink`.
    ///
    /// On error no partial catalog is returned.
    pub fn build_with_events<R: RngCore>(
        &self,
        rng: &mut R,
        sink: &mut dyn EventSink,
    ) -> Result<CatalogReport> {
        let (target, expected_count) = match self.config.policy {
            CountPolicy::Fixed(k) => (k, None),
            CountPolicy::Poisson => {
                let mean = self.expected_count();
                (sample_poisson(mean, rng), Some(mean))
            }
        };

        info!(
            "Building catalog: policy {:?} | target {} sources.",
            self.config.policy, target
        );
        if sink.wants(SimEventKind::CatalogStarted) {
            sink.send(SimEvent::CatalogStarted {
                policy: self.config.policy,
                target,
                expected_count,
            });
        }

        let capacity = usize::try_from(target)
            .map_err(|_| Error::InvalidConfig(format!("target count {target} is too large")))?;
        let mut catalog = Catalog::with_capacity(capacity.min(1 << 20));
        let mut flux_stats = RejectionStats::default();
        let mut position_stats = RejectionStats::default();

        for index in 0..capacity {
            let flux = self.sampler.sample_with_stats(rng, &mut flux_stats)?;
            let pixel = sample_position_with_stats(self.template, rng, &mut position_stats);
            let source = Source::new(pixel, flux);
            catalog.push(source);
            if sink.wants(SimEventKind::SourceAccepted) {
                sink.send(SimEvent::SourceAccepted { index, source });
            }
        }

        self.report_acceptance(&flux_stats, sink);
        info!(
            "Catalog finished: {} sources | total flux {:.4}.",
            catalog.len(),
            catalog.total_flux()
        );
        if sink.wants(SimEventKind::CatalogFinished) {
            sink.send(SimEvent::CatalogFinished {
                sources: catalog.len(),
                total_flux: catalog.total_flux(),
                flux_stats,
                position_stats,
            });
        }

        Ok(CatalogReport {
            catalog,
            flux_stats,
            position_stats,
            expected_count,
        })
    }

    fn report_acceptance(&self, flux_stats: &RejectionStats, sink: &mut dyn EventSink) {
        let Some(rate) = flux_stats.acceptance_rate() else {
            return;
        };
        debug!(
            "Flux acceptance rate {:.4} over {} proposals.",
            rate, flux_stats.attempts
        );
        if rate < LOW_ACCEPTANCE_RATE {
            warn!(
                "Flux acceptance rate {:.5} is low; tighten the envelope.",
                rate
            );
            if sink.wants(SimEventKind::Warning) {
                sink.send(SimEvent::Warning {
                    context: "catalog".into(),
                    message: format!("Low flux acceptance rate {rate:.5}"),
                });
            }
        }
        if flux_stats.domination_violations > 0 {
            warn!(
                "Envelope fell below the number count on {} proposals; samples are biased.",
                flux_stats.domination_violations
            );
            if sink.wants(SimEventKind::Warning) {
                sink.send(SimEvent::Warning {
                    context: "catalog".into(),
                    message: format!(
                        "Envelope violated on {} proposals",
                        flux_stats.domination_violations
                    ),
                });
            }
        }
    }
}
