//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, distributions or templates without support, envelope domination
//! failures found by the optional check, exhausted attempt budgets, and generic errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("empty support: {0}")]
    EmptySupport(String),

    #[error("envelope {envelope} does not dominate target {target} at flux {flux}")]
    EnvelopeViolation {
        flux: f64,
        target: f64,
        envelope: f64,
    },

    #[error("no sample accepted after {attempts} attempts")]
    SamplingExhausted { attempts: u64 },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
