//! Analysis trait abstractions
//!
//! These traits define the interface for swappable fingerprinting and
//! rendering backends. The pipeline only talks to these traits.

use crate::error::Result;
use crate::types::{AudioClip, GainVector, SpectralProfile};

/// Spectral fingerprint backend
pub trait ProfileExtractor: Send + Sync {
    /// Reduce a clip to one dB level per frequency band
    fn extract(&self, clip: &AudioClip) -> Result<SpectralProfile>;

    /// Get the name of this extractor (for logging)
    fn name(&self) -> &'static str;
}

/// Equalization rendering backend
pub trait BandRenderer: Send + Sync {
    /// Produce a new clip with the per-band gains applied
    fn render(&self, clip: &AudioClip, gains: &GainVector) -> Result<AudioClip>;

    /// Get the name of this renderer (for logging)
    fn name(&self) -> &'static str;
}
