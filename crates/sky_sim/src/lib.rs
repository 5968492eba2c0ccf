#![forbid(unsafe_code)]
//! sky_sim: Monte Carlo sky maps of unresolved point-source populations.
//!
//! Modules:
//! - distribution: number counts dN/dS, proposal envelopes, spatial templates
//! - sampling: rejection samplers for flux and position, Poisson draws
//! - catalog: catalog builder with fixed-count and Poisson termination policies
//! - render: response kernels, intensity and counts maps, the map renderer
//! - realization: seeded, parallel batches of catalogs and maps
//! - events: progress and diagnostics sinks
//!
//! For examples and docs, see README and docs.rs.
pub mod catalog;
pub mod distribution;
pub mod error;
pub mod events;
pub mod grid;
pub mod realization;
pub mod render;
pub mod sampling;

/// Convenient re-exports for common types. Import with `use sky_sim::prelude::*;`.
pub mod prelude {
    pub use crate::catalog::{
        Catalog, CatalogBuilder, CatalogConfig, CatalogReport, CountPolicy, Source,
    };
    pub use crate::distribution::{
        BrokenPowerLaw, Envelope, FnNumberCount, NumberCount, PowerLaw, PowerLawEnvelope,
        SpatialTemplate, UniformEnvelope,
    };
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventSink, FnSink, MultiSink, SimEvent, SimEventKind, VecSink};
    pub use crate::grid::PixelGrid;
    pub use crate::realization::{
        generate_realizations, run_realization, seed_for_realization, Realization,
    };
    pub use crate::render::{
        render, render_intensity, CountsMap, IntensityMap, MapRenderer, RenderConfig,
        RenderMode, ResponseKernel,
    };
    pub use crate::sampling::{
        sample_flux, sample_poisson, sample_position, FluxSampler, RejectionStats, WeightTable,
    };
}
