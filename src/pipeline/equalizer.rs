//! Single-clip equalization
//!
//! Extract → compare → clamp → render → export for one clip. Typed errors
//! from each stage are collapsed into an [`EqualizationResult`] at the end.

use crate::analysis::{
    BandRenderer, Comparison, ProfileComparator, ProfileExtractor, StftProfileExtractor,
};
use crate::audio::{self, WavFormat};
use crate::config::Settings;
use crate::error::{GenreqError, Result};
use crate::profiles::{self, GenreProfileStore};
use crate::render::SequentialBandRenderer;
use crate::types::{AudioClip, EqualizationResult, GainLimit, GainVector, GenreKey};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A rendered clip together with the correction that produced it
#[derive(Debug, Clone)]
pub struct Equalized {
    pub clip: AudioClip,
    pub comparison: Comparison,
    /// Gains actually rendered, after any clamp
    pub applied_gains: GainVector,
}

/// Extractor, comparator and renderer wired together
///
/// Holds no per-clip state, so one instance can equalize many clips
/// concurrently.
pub struct Equalizer {
    extractor: Arc<dyn ProfileExtractor>,
    comparator: ProfileComparator,
    renderer: Arc<dyn BandRenderer>,
    gain_limit: Option<GainLimit>,
    output_format: Option<WavFormat>,
}

impl Equalizer {
    /// Default extractor and renderer against the given profile store
    pub fn new(store: Arc<dyn GenreProfileStore>) -> Self {
        Self {
            extractor: Arc::new(StftProfileExtractor::default()),
            comparator: ProfileComparator::new(store),
            renderer: Arc::new(SequentialBandRenderer::new()),
            gain_limit: None,
            output_format: None,
        }
    }

    /// Build from runtime settings, opening the configured profile store
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = profiles::open_store(settings.profiles_path.as_deref())?;
        Ok(Self::new(store)
            .with_extractor(Arc::new(StftProfileExtractor::new(settings.backend)))
            .with_gain_limit(settings.gain_limit)
            .with_output_format(settings.output_format))
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ProfileExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn BandRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_gain_limit(mut self, gain_limit: Option<GainLimit>) -> Self {
        self.gain_limit = gain_limit;
        self
    }

    /// `None` follows the bit depth of each source clip
    pub fn with_output_format(mut self, format: Option<WavFormat>) -> Self {
        self.output_format = format;
        self
    }

    /// Equalize an in-memory clip
    pub fn equalize_clip(&self, clip: &AudioClip, genre: &GenreKey) -> Result<Equalized> {
        let measured = self.extractor.extract(clip)?;
        let comparison = self.comparator.compare(&measured, genre)?;

        let applied_gains = match &self.gain_limit {
            Some(limit) => comparison.gains.clamped(limit),
            None => comparison.gains,
        };
        if applied_gains != comparison.gains {
            debug!(
                "Clamped gains {:?} to {:?}",
                comparison.gains.gains(),
                applied_gains.gains()
            );
        }

        let rendered = self.renderer.render(clip, &applied_gains)?;

        Ok(Equalized {
            clip: rendered,
            comparison,
            applied_gains,
        })
    }

    /// Equalize `input` towards `genre` and write the result to `output`
    ///
    /// Never returns an error: failures are classified in the result and
    /// no output file is left behind.
    pub fn equalize_file(&self, input: &Path, output: &Path, genre: &GenreKey) -> EqualizationResult {
        let start = Instant::now();

        match self.try_equalize_file(input, output, genre) {
            Ok((equalized, duration_seconds)) => {
                info!(
                    "Equalized {} as {} in {:.2}s",
                    input.display(),
                    genre,
                    start.elapsed().as_secs_f64()
                );
                EqualizationResult {
                    input: input.to_path_buf(),
                    genre: genre.clone(),
                    success: true,
                    output: Some(output.to_path_buf()),
                    failure: None,
                    error: None,
                    comparison: Some(equalized.comparison),
                    applied_gains: Some(equalized.applied_gains),
                    duration_seconds,
                }
            }
            Err(e) => {
                if e.is_recoverable() {
                    warn!("Skipping {}: {}", input.display(), e);
                } else {
                    error!("Failed {}: {}", input.display(), e);
                }
                EqualizationResult::failed(input.to_path_buf(), genre.clone(), &e)
            }
        }
    }

    fn try_equalize_file(
        &self,
        input: &Path,
        output: &Path,
        genre: &GenreKey,
    ) -> Result<(Equalized, f64)> {
        debug!(
            "Equalizing {} with {} / {}",
            input.display(),
            self.extractor.name(),
            self.renderer.name()
        );

        let clip = audio::decode_clip(input)?;
        let equalized = self
            .equalize_clip(&clip, genre)
            .map_err(|e| with_input_path(e, input))?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| GenreqError::output_error(output, e))?;
            }
        }

        let format = self
            .output_format
            .unwrap_or_else(|| WavFormat::for_source(clip.bits_per_sample));
        audio::write_wav(&equalized.clip, output, format)?;

        Ok((equalized, clip.duration()))
    }
}

impl std::fmt::Debug for Equalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Equalizer")
            .field("extractor", &self.extractor.name())
            .field("comparator", &self.comparator)
            .field("renderer", &self.renderer.name())
            .field("gain_limit", &self.gain_limit)
            .field("output_format", &self.output_format)
            .finish()
    }
}

/// Equalize one file with the given equalizer
pub fn equalize_file(
    input: &Path,
    output: &Path,
    genre: &GenreKey,
    equalizer: &Equalizer,
) -> EqualizationResult {
    equalizer.equalize_file(input, output, genre)
}

/// Extraction errors are raised without a path
fn with_input_path(err: GenreqError, input: &Path) -> GenreqError {
    match err {
        GenreqError::AnalysisError { path, reason } if path.as_os_str().is_empty() => {
            GenreqError::AnalysisError {
                path: input.to_path_buf(),
                reason,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::profiles::{BuiltinProfileStore, ProfileCatalog};
    use crate::types::SpectralProfile;
    use std::f32::consts::PI;
    use tempfile::TempDir;

    fn tone(freq: f32, amplitude: f32, secs: f32) -> AudioClip {
        let sr = 44100;
        let n = (sr as f32 * secs) as usize;
        let samples = (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect();
        AudioClip::mono(samples, sr)
    }

    fn builtin() -> Equalizer {
        Equalizer::new(Arc::new(BuiltinProfileStore::new()))
    }

    #[test]
    fn test_equalize_clip_reports_triple() {
        let clip = tone(440.0, 0.1, 0.5);
        let eq = builtin().equalize_clip(&clip, &GenreKey::new("Rock")).unwrap();

        for i in 0..10 {
            let expected = eq.comparison.measured[i] - eq.comparison.reference[i];
            assert_eq!(eq.comparison.gains[i], expected);
        }
        assert_eq!(eq.applied_gains, eq.comparison.gains);
        assert_eq!(eq.clip.num_frames(), clip.num_frames());
        assert_eq!(eq.clip.sample_rate, clip.sample_rate);
    }

    #[test]
    fn test_gain_limit_is_applied() {
        let clip = tone(440.0, 0.1, 0.5);
        let limit = GainLimit::new(-6.0, 6.0).unwrap();
        let eq = builtin()
            .with_gain_limit(Some(limit))
            .equalize_clip(&clip, &GenreKey::new("Rock"))
            .unwrap();

        assert!(eq.applied_gains.gains().iter().all(|g| (-6.0..=6.0).contains(g)));
        // Quiet bands sit near the floor, far below any preset
        assert!(eq.comparison.gains.gains().iter().any(|g| *g < -6.0));
    }

    #[test]
    fn test_unknown_genre_in_memory() {
        let clip = tone(440.0, 0.1, 0.2);
        let store: ProfileCatalog =
            std::iter::once(("Ambient".to_string(), SpectralProfile::new([0.0; 10]))).collect();
        let err = Equalizer::new(Arc::new(store))
            .equalize_clip(&clip, &GenreKey::new("Rock"))
            .unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::UnknownGenre);
    }

    #[test]
    fn test_equalize_file_missing_input() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.wav");
        let result = builtin().equalize_file(
            &dir.path().join("missing.wav"),
            &output,
            &GenreKey::new("Rock"),
        );
        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::Analysis));
        assert!(!output.exists());
    }

    #[test]
    fn test_analysis_error_gets_input_path() {
        let err = GenreqError::AnalysisError {
            path: Default::default(),
            reason: "empty".to_string(),
        };
        match with_input_path(err, Path::new("a.wav")) {
            GenreqError::AnalysisError { path, .. } => assert_eq!(path, Path::new("a.wav")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
