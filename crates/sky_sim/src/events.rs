//! Event types and sinks for observing catalog generation and rendering.
//!
//! This module defines [`SimEvent`] and a set of sinks to emit, collect, or forward events
//! while running [`crate::catalog::CatalogBuilder::build_with_events`] or
//! [`crate::render::MapRenderer::render_with_events`]. Events carry the acceptance-rate
//! diagnostics needed to tune envelopes.
use crate::catalog::{CountPolicy, Source};
use crate::render::RenderMode;
use crate::sampling::RejectionStats;

/// Describes events emitted while generating catalogs and maps.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// Emitted once the target source count is known.
    CatalogStarted {
        /// Termination policy in effect.
        policy: CountPolicy,
        /// Number of sources that will be drawn.
        target: u64,
        /// Poisson mean for [`CountPolicy::Poisson`], `None` for fixed counts.
        expected_count: Option<f64>,
    },

    /// Emitted for each accepted source.
    SourceAccepted {
        /// Position of the source in the catalog.
        index: usize,
        /// The accepted source.
        source: Source,
    },

    /// Emitted when a catalog is complete.
    CatalogFinished {
        /// Number of sources in the catalog.
        sources: usize,
        /// Sum of source fluxes.
        total_flux: f64,
        /// Flux rejection loop counters.
        flux_stats: RejectionStats,
        /// Position rejection loop counters.
        position_stats: RejectionStats,
    },

    /// Emitted when rendering starts.
    RenderStarted {
        /// Number of sources to render.
        sources: usize,
        /// Number of pixels in the grid.
        pixels: usize,
        /// Rendering mode.
        mode: RenderMode,
    },

    /// Emitted when a counts map is complete.
    RenderFinished {
        /// Expected counts on the grid before Poisson noise.
        expected_total: f64,
        /// Counts in the realized map.
        observed_total: u64,
    },

    /// Non-fatal warning.
    Warning {
        /// Context string (e.g. "catalog", "render").
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`SimEvent`] used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimEventKind {
    CatalogStarted,
    SourceAccepted,
    CatalogFinished,
    RenderStarted,
    RenderFinished,
    Warning,
}

impl SimEvent {
    pub fn kind(&self) -> SimEventKind {
        match self {
            SimEvent::CatalogStarted { .. } => SimEventKind::CatalogStarted,
            SimEvent::SourceAccepted { .. } => SimEventKind::SourceAccepted,
            SimEvent::CatalogFinished { .. } => SimEventKind::CatalogFinished,
            SimEvent::RenderStarted { .. } => SimEventKind::RenderStarted,
            SimEvent::RenderFinished { .. } => SimEventKind::RenderFinished,
            SimEvent::Warning { .. } => SimEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`SimEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: SimEvent);

    /// Whether events of `kind` should be built and sent at all.
    ///
    /// Emitters check this before constructing per-source events.
    fn wants(&self, _kind: SimEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = SimEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: SimEvent) {}

    #[inline]
    fn wants(&self, _kind: SimEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(SimEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(SimEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(SimEvent),
{
    #[inline]
    fn send(&mut self, event: SimEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally filtered by kind.
#[derive(Default)]
pub struct VecSink {
    events: Vec<SimEvent>,
    only: Option<Vec<SimEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            only: None,
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collect only events of the listed kinds.
    pub fn only(kinds: &[SimEventKind]) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.to_vec()),
        }
    }

    pub fn into_inner(self) -> Vec<SimEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: SimEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: SimEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn into_sinks(self) -> Vec<S> {
        self.sinks
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: SimEvent) {
        if self.sinks.is_empty() {
            return;
        }
        let last_idx = self.sinks.len() - 1;
        for i in 0..last_idx {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last_idx].send(event);
    }

    fn wants(&self, kind: SimEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}
