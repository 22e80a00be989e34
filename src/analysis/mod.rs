//! Audio analysis: tempo and key estimation
//!
//! The trait abstraction allows swapping estimation backends without
//! touching pipeline code; the defaults are the in-crate DSP estimators.

pub mod key;
pub mod tempo;
pub mod traits;

pub use key::ChromaKeyEstimator;
pub use tempo::OnsetTempoEstimator;
pub use traits::{KeyEstimator, TempoEstimator};
