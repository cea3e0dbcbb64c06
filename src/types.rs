//! Core data types for genreq
//!
//! These types represent the domain model and flow through the pipeline.

use crate::analysis::bands::{FREQUENCY_BANDS, NUM_BANDS};
pub use crate::error::FailureKind;
use crate::error::{GenreqError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Audio clips
// =============================================================================

/// Decoded multi-channel audio
///
/// Samples are planar (`channels[c][frame]`) and normalized to [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// One sample vector per channel
    pub channels: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bit depth of the decoded source, when known
    pub bits_per_sample: Option<u16>,
}

impl AudioClip {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: None,
        }
    }

    /// Single-channel clip
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(vec![samples], sample_rate)
    }

    /// Build from interleaved samples `[c0, c1, .., c0, c1, ..]`
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], num_channels: usize, sample_rate: u32) -> Self {
        if num_channels == 0 {
            return Self::new(Vec::new(), sample_rate);
        }

        let num_frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(num_frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// Interleaved samples `[c0, c1, .., c0, c1, ..]`
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.num_frames();
        let mut result = Vec::with_capacity(frames * self.num_channels());
        for i in 0..frames {
            for channel in &self.channels {
                result.push(channel[i]);
            }
        }
        result
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames (shortest channel)
    pub fn num_frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Check if the clip carries no samples
    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        // Guard against division by zero - use 0 duration for invalid sample rate
        if self.sample_rate > 0 {
            self.num_frames() as f64 / self.sample_rate as f64
        } else {
            0.0
        }
    }

    /// Average all channels into a single mono signal
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels.len() {
            0 => Vec::new(),
            1 => self.channels[0].clone(),
            n => (0..self.num_frames())
                .map(|i| self.channels.iter().map(|c| c[i]).sum::<f32>() / n as f32)
                .collect(),
        }
    }

    /// Check the clip has a shape the renderer and encoder can handle
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(GenreqError::render_error("clip has no channels"));
        }
        if self.sample_rate == 0 {
            return Err(GenreqError::render_error("clip has a sample rate of 0 Hz"));
        }
        let frames = self.channels[0].len();
        if self.channels.iter().any(|c| c.len() != frames) {
            return Err(GenreqError::render_error(format!(
                "channel lengths differ across {} channels",
                self.channels.len()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Band-aligned vectors
// =============================================================================

/// Ten dB levels, one per frequency band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct SpectralProfile([f32; NUM_BANDS]);

impl SpectralProfile {
    pub fn new(levels: [f32; NUM_BANDS]) -> Self {
        Self(levels)
    }

    /// Build from a slice, which must hold exactly ten finite values
    pub fn from_slice(levels: &[f32]) -> Result<Self> {
        let array: [f32; NUM_BANDS] =
            levels
                .try_into()
                .map_err(|_| GenreqError::InvalidProfile {
                    reason: format!("expected {} band levels, got {}", NUM_BANDS, levels.len()),
                })?;
        if let Some(i) = array.iter().position(|v| !v.is_finite()) {
            return Err(GenreqError::InvalidProfile {
                reason: format!("level for band '{}' is not finite", FREQUENCY_BANDS[i].name),
            });
        }
        Ok(Self(array))
    }

    pub fn levels(&self) -> &[f32; NUM_BANDS] {
        &self.0
    }

    /// Pair each level with its band name
    pub fn named_levels(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        FREQUENCY_BANDS.iter().map(|b| b.name).zip(self.0.iter().copied())
    }
}

impl TryFrom<Vec<f32>> for SpectralProfile {
    type Error = GenreqError;

    fn try_from(levels: Vec<f32>) -> Result<Self> {
        Self::from_slice(&levels)
    }
}

impl From<SpectralProfile> for Vec<f32> {
    fn from(profile: SpectralProfile) -> Self {
        profile.0.to_vec()
    }
}

impl std::ops::Index<usize> for SpectralProfile {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

/// Per-band gain corrections in dB (measured minus reference)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainVector([f32; NUM_BANDS]);

impl GainVector {
    pub fn new(gains: [f32; NUM_BANDS]) -> Self {
        Self(gains)
    }

    /// All-zero corrections
    pub fn zeros() -> Self {
        Self([0.0; NUM_BANDS])
    }

    pub fn gains(&self) -> &[f32; NUM_BANDS] {
        &self.0
    }

    /// Restrict every gain to the limit's range
    pub fn clamped(&self, limit: &GainLimit) -> Self {
        Self(self.0.map(|g| g.clamp(limit.min_db, limit.max_db)))
    }

    /// Linear amplitude factor for the band at `index`
    pub fn linear(&self, index: usize) -> f32 {
        db_to_linear(self.0[index])
    }
}

impl std::ops::Index<usize> for GainVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

/// Convert a dB value to a linear amplitude factor
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Inclusive gain range applied to a [`GainVector`] before rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainLimit {
    pub min_db: f32,
    pub max_db: f32,
}

impl GainLimit {
    /// Create a limit, rejecting inverted or non-finite ranges
    pub fn new(min_db: f32, max_db: f32) -> Result<Self> {
        if !min_db.is_finite() || !max_db.is_finite() {
            return Err(GenreqError::ConfigError(
                "gain limits must be finite numbers".to_string(),
            ));
        }
        if min_db > max_db {
            return Err(GenreqError::ConfigError(format!(
                "minimum gain {} dB exceeds maximum gain {} dB",
                min_db, max_db
            )));
        }
        Ok(Self { min_db, max_db })
    }
}

// =============================================================================
// Genre keys and results
// =============================================================================

/// Opaque identifier for a reference profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreKey(String);

impl GenreKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased, trimmed form used for lookups
    pub fn normalized(&self) -> String {
        self.0.trim().to_lowercase()
    }

    /// Filesystem-safe form used in output file names
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.0.len());
        for c in self.0.trim().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('-') {
                slug.push('-');
            }
        }
        slug.trim_matches('-').to_string()
    }
}

impl fmt::Display for GenreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GenreKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Outcome of equalizing a single clip
#[derive(Debug, Clone)]
pub struct EqualizationResult {
    /// Input clip path
    pub input: PathBuf,
    /// Requested genre
    pub genre: GenreKey,
    /// Whether the clip was equalized and written
    pub success: bool,
    /// Destination of the equalized clip (set only on success)
    pub output: Option<PathBuf>,
    /// Failure classification (set only on failure)
    pub failure: Option<FailureKind>,
    /// Human-readable error (set only on failure)
    pub error: Option<String>,
    /// Profiles and gains used for the render, when comparison was reached
    pub comparison: Option<crate::analysis::Comparison>,
    /// Gains actually rendered, after any clamp
    pub applied_gains: Option<GainVector>,
    /// Duration of the input clip in seconds
    pub duration_seconds: f64,
}

impl EqualizationResult {
    /// Collapse a typed failure into the caller-facing result
    pub fn failed(input: PathBuf, genre: GenreKey, err: &GenreqError) -> Self {
        Self {
            input,
            genre,
            success: false,
            output: None,
            failure: Some(err.failure_kind()),
            error: Some(err.to_string()),
            comparison: None,
            applied_gains: None,
            duration_seconds: 0.0,
        }
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats genreq can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    Aiff,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "aiff" | "aif" => Some(AudioFormat::Aiff),
            _ => None,
        }
    }

    /// Short lowercase name, also used to tell apart outputs of same-stem inputs
    pub fn tag(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Aiff => "aiff",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_round_trip_shape() {
        let clip = AudioClip::from_interleaved(&[0.1, 0.2, 0.3, 0.4, 0.5], 2, 44100);
        assert_eq!(clip.num_channels(), 2);
        assert_eq!(clip.num_frames(), 2);
        assert_eq!(clip.channels[0], vec![0.1, 0.3]);
        assert_eq!(clip.channels[1], vec![0.2, 0.4]);
        assert_eq!(clip.interleaved(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_to_mono_averages_channels() {
        let clip = AudioClip::new(vec![vec![0.5, 0.8], vec![0.3, 0.2]], 44100);
        let mono = clip.to_mono();
        assert!((mono[0] - 0.4).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_duration_guards_zero_rate() {
        let clip = AudioClip::mono(vec![0.0; 100], 0);
        assert_eq!(clip.duration(), 0.0);
        let clip = AudioClip::mono(vec![0.0; 22050], 44100);
        assert!((clip.duration() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        assert!(AudioClip::new(vec![], 44100).validate().is_err());
        assert!(AudioClip::mono(vec![0.0; 4], 0).validate().is_err());
        assert!(AudioClip::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100)
            .validate()
            .is_err());
        assert!(AudioClip::new(vec![vec![0.0; 4], vec![0.0; 4]], 44100)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_profile_requires_ten_finite_levels() {
        assert!(SpectralProfile::from_slice(&[0.0; 9]).is_err());
        assert!(SpectralProfile::from_slice(&[0.0; 11]).is_err());
        let mut levels = [0.0f32; 10];
        levels[3] = f32::NAN;
        let err = SpectralProfile::from_slice(&levels).unwrap_err();
        assert!(err.to_string().contains("midrange"));
        assert!(SpectralProfile::from_slice(&[1.0; 10]).is_ok());
    }

    #[test]
    fn test_profile_serde_as_array() {
        let profile = SpectralProfile::new([4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0, -5.0]);
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, "[4.0,3.0,2.0,1.0,0.0,-1.0,-2.0,-3.0,-4.0,-5.0]");
        let back: SpectralProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
        assert!(serde_json::from_str::<SpectralProfile>("[1.0, 2.0]").is_err());
    }

    #[test]
    fn test_gain_clamp() {
        let gains = GainVector::new([-30.0, -6.0, 0.0, 6.0, 30.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let limit = GainLimit::new(-12.0, 12.0).unwrap();
        let clamped = gains.clamped(&limit);
        assert_eq!(clamped[0], -12.0);
        assert_eq!(clamped[1], -6.0);
        assert_eq!(clamped[4], 12.0);
    }

    #[test]
    fn test_gain_limit_validation() {
        assert!(GainLimit::new(6.0, -6.0).is_err());
        assert!(GainLimit::new(f32::NEG_INFINITY, 0.0).is_err());
        assert!(GainLimit::new(-6.0, -6.0).is_ok());
    }

    #[test]
    fn test_db_to_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(20.0) - 10.0).abs() < 1e-4);
        assert!((db_to_linear(-6.0) - 0.501_187).abs() < 1e-4);
    }

    #[test]
    fn test_genre_key_forms() {
        let key = GenreKey::new("  Chiptune / Glitch ");
        assert_eq!(key.normalized(), "chiptune / glitch");
        assert_eq!(key.slug(), "chiptune-glitch");
        assert_eq!(GenreKey::new("Hip-Hop").slug(), "hip-hop");
    }

    #[test]
    fn test_audio_format_detection() {
        assert_eq!(AudioFormat::from_extension("WAV"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_extension("aif"), Some(AudioFormat::Aiff));
        assert_eq!(AudioFormat::from_extension("ogg"), None);
        assert_eq!(AudioFormat::from_extension("AIF").map(|f| f.tag()), Some("aiff"));
    }
}
