//! Source catalogs: the hand-off between sampling and rendering.
//!
//! A [`Catalog`] is an ordered list of [`Source`]s in generation order. Build one with
//! [`builder::CatalogBuilder`], or assemble it from external data via
//! [`Catalog::from_sources`].
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod builder;

pub use builder::{CatalogBuilder, CatalogConfig, CatalogReport, CountPolicy};

/// A point source at a pixel with a given flux.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Source {
    pixel: usize,
    flux: f64,
}

impl Source {
    pub fn new(pixel: usize, flux: f64) -> Self {
        Self { pixel, flux }
    }

    /// Flat pixel index hosting the source.
    #[inline]
    pub fn pixel(&self) -> usize {
        self.pixel
    }

    #[inline]
    pub fn flux(&self) -> f64 {
        self.flux
    }
}

/// Ordered, append-only collection of sources.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Catalog {
    sources: Vec<Source>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            sources: Vec::with_capacity(cap),
        }
    }

    /// Wraps externally produced sources. Every flux must be finite and non-negative.
    pub fn from_sources(sources: Vec<Source>) -> Result<Self> {
        if let Some((i, s)) = sources
            .iter()
            .enumerate()
            .find(|(_, s)| !s.flux.is_finite() || s.flux < 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "source {i} has invalid flux {}",
                s.flux
            )));
        }
        Ok(Self { sources })
    }

    pub(crate) fn push(&mut self, source: Source) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.sources.iter()
    }

    pub fn as_slice(&self) -> &[Source] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<Source> {
        self.sources
    }

    /// Sum of all source fluxes.
    pub fn total_flux(&self) -> f64 {
        self.sources.iter().map(|s| s.flux).sum()
    }

    pub fn fluxes(&self) -> impl Iterator<Item = f64> + '_ {
        self.sources.iter().map(|s| s.flux)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
