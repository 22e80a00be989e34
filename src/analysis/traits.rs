//! Analysis trait abstractions
//!
//! These traits define the interface for swappable estimation backends.
//! The defaults are the in-crate autocorrelation and chroma estimators.

use crate::error::Result;
use crate::types::{AudioBuffer, PitchClass};

/// Tempo estimation backend
pub trait TempoEstimator: Send + Sync {
    /// Estimate a single dominant tempo (BPM) from decoded audio
    ///
    /// Detection is approximate: half/double-tempo errors on ambiguous
    /// material are an accepted limitation, not corrected here.
    fn estimate(&self, buffer: &AudioBuffer) -> Result<f64>;

    /// Name of this estimator (for logging)
    fn name(&self) -> &'static str;
}

/// Musical key estimation backend
pub trait KeyEstimator: Send + Sync {
    /// Detect the dominant pitch class from decoded audio
    ///
    /// No major/minor mode is inferred at detection time.
    fn estimate(&self, buffer: &AudioBuffer) -> Result<PitchClass>;

    /// Name of this estimator (for logging)
    fn name(&self) -> &'static str;
}
