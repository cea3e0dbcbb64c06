//! Spectral fingerprint extraction
//!
//! A clip is mixed to mono, brought to the 44.1kHz analysis rate and
//! transformed with a 4096-point STFT. Each band's level is the loudest bin
//! magnitude inside the band over the whole clip, in dB relative to the
//! loudest magnitude anywhere in the spectrum.

use super::bands::{FREQUENCY_BANDS, NUM_BANDS, SILENCE_FLOOR_DB};
use super::stft::{self, PeakSpectrum};
use super::traits::ProfileExtractor;
use crate::audio::{resample, ANALYSIS_SAMPLE_RATE};
use crate::config::ComputeBackend;
use crate::error::{GenreqError, Result};
use crate::types::{AudioClip, SpectralProfile};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Smallest magnitude considered non-silent
const AMPLITUDE_MIN: f32 = 1e-5;

/// Added to the reference magnitude before taking the ratio
const REFERENCE_EPSILON: f32 = 1e-6;

/// STFT-based fingerprint extractor
#[derive(Debug, Clone)]
pub struct StftProfileExtractor {
    backend: ComputeBackend,
}

impl StftProfileExtractor {
    pub fn new(backend: ComputeBackend) -> Self {
        Self {
            backend: backend.resolve(),
        }
    }

    /// Raw per-band peak magnitudes (no normalization)
    ///
    /// Bands without any spectral bin report 0.
    pub fn band_magnitudes(&self, clip: &AudioClip) -> Result<[f32; NUM_BANDS]> {
        let spectrum = self.spectrum(clip)?;
        Ok(self.band_peaks(&spectrum).map(|peak| peak.unwrap_or(0.0)))
    }

    fn spectrum(&self, clip: &AudioClip) -> Result<PeakSpectrum> {
        if clip.is_empty() {
            return Err(analysis_error("clip contains no samples"));
        }
        if clip.sample_rate == 0 {
            return Err(analysis_error("clip has a sample rate of 0 Hz"));
        }

        let mono = clip.to_mono();
        if mono.iter().any(|s| !s.is_finite()) {
            return Err(analysis_error("clip contains non-finite samples"));
        }

        let samples = if clip.sample_rate != ANALYSIS_SAMPLE_RATE {
            debug!(
                "Resampling {}Hz -> {}Hz for analysis",
                clip.sample_rate, ANALYSIS_SAMPLE_RATE
            );
            resample(&mono, clip.sample_rate, ANALYSIS_SAMPLE_RATE)
        } else {
            mono
        };

        if samples.is_empty() {
            return Err(analysis_error("clip is empty after resampling"));
        }

        Ok(stft::peak_spectrum(&samples, ANALYSIS_SAMPLE_RATE, self.backend))
    }

    /// Loudest bin inside each band, `None` when a band holds no bin
    fn band_peaks(&self, spectrum: &PeakSpectrum) -> [Option<f32>; NUM_BANDS] {
        let scan = |band: &super::bands::FrequencyBand| {
            spectrum
                .peaks
                .iter()
                .enumerate()
                .filter(|(k, _)| band.contains(spectrum.bin_frequency(*k)))
                .map(|(_, &m)| m)
                .reduce(f32::max)
        };

        let peaks: Vec<Option<f32>> = match self.backend {
            ComputeBackend::Parallel => FREQUENCY_BANDS.par_iter().map(scan).collect(),
            _ => FREQUENCY_BANDS.iter().map(scan).collect(),
        };

        let mut out = [None; NUM_BANDS];
        out.copy_from_slice(&peaks);
        out
    }
}

impl Default for StftProfileExtractor {
    fn default() -> Self {
        Self::new(ComputeBackend::Auto)
    }
}

impl ProfileExtractor for StftProfileExtractor {
    fn extract(&self, clip: &AudioClip) -> Result<SpectralProfile> {
        let spectrum = self.spectrum(clip)?;
        let global_max = spectrum.global_max();

        if global_max <= AMPLITUDE_MIN {
            debug!("Clip is silent, using floor for every band");
            return Ok(SpectralProfile::new([SILENCE_FLOOR_DB; NUM_BANDS]));
        }

        let reference = global_max + REFERENCE_EPSILON;
        let levels = self.band_peaks(&spectrum).map(|peak| match peak {
            Some(m) => amplitude_to_db(m, reference),
            None => SILENCE_FLOOR_DB,
        });

        debug!("Measured profile: {:?}", levels);

        SpectralProfile::from_slice(&levels)
            .map_err(|e| analysis_error(format!("profile is not usable: {}", e)))
    }

    fn name(&self) -> &'static str {
        "stft-peak"
    }
}

/// dB of `magnitude` relative to `reference`
///
/// Magnitudes below [`AMPLITUDE_MIN`] count as `AMPLITUDE_MIN`. The result
/// is not floored: a very quiet band may sit well below the silence level.
fn amplitude_to_db(magnitude: f32, reference: f32) -> f32 {
    20.0 * (magnitude.max(AMPLITUDE_MIN) / reference).log10()
}

/// The pipeline fills in the path
fn analysis_error(reason: impl Into<String>) -> GenreqError {
    GenreqError::AnalysisError {
        path: PathBuf::new(),
        reason: reason.into(),
    }
}
