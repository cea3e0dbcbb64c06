//! JSON diagnostics report
//!
//! Records, per clip, which correction was applied: the measured and
//! reference fingerprints, the raw gain vector and the gains actually
//! rendered after any clamp.

use crate::analysis::FREQUENCY_BANDS;
use crate::error::{FailureKind, GenreqError, Result};
use crate::types::EqualizationResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON output structure
#[derive(Debug, Serialize, Deserialize)]
pub struct GenreqReport {
    /// Schema version for forward compatibility
    pub version: String,
    /// Run metadata
    pub metadata: ReportMetadata,
    /// One entry per processed clip
    pub clips: Vec<ClipReport>,
}

/// Report metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// genreq version that generated this file
    pub generator_version: String,
    /// Timestamp of export
    pub exported_at: String,
    /// Number of clips
    pub clip_count: usize,
}

/// Outcome and correction for a single clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipReport {
    pub input: String,
    pub genre: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_seconds: f64,
    /// Per-band correction, present once comparison succeeded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bands: Vec<BandReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandReport {
    pub band: String,
    pub lower_hz: f32,
    pub upper_hz: f32,
    pub measured_db: f32,
    pub reference_db: f32,
    pub gain_db: f32,
    pub applied_gain_db: f32,
}

/// Write equalization results to a JSON file
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
/// This prevents data corruption if the write is interrupted.
pub fn write_report(results: &[EqualizationResult], output_path: &Path) -> Result<()> {
    // Write to temp file in same directory (ensures same filesystem for atomic rename)
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| GenreqError::OutputError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;

    let output = GenreqReport {
        version: SCHEMA_VERSION.to_string(),
        metadata: ReportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            clip_count: results.len(),
        },
        clips: results.iter().map(clip_to_json).collect(),
    };

    write_pretty(file, &output).map_err(|reason| {
        // Clean up temp file on error
        let _ = std::fs::remove_file(&temp_path);
        GenreqError::OutputError {
            path: output_path.to_path_buf(),
            reason,
        }
    })?;

    // Atomic rename: either succeeds completely or fails without modifying target
    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        GenreqError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    info!("Wrote {} clip reports to {}", results.len(), output_path.display());

    Ok(())
}

/// Serialize `value` as pretty JSON through a buffer, flushing it before returning
pub(crate) fn write_pretty<W: Write, T: Serialize>(
    sink: W,
    value: &T,
) -> std::result::Result<(), String> {
    let mut writer = BufWriter::new(sink);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| e.to_string())?;
    writer
        .flush()
        .map_err(|e| format!("Failed to flush: {}", e))
}

pub fn clip_to_json(result: &EqualizationResult) -> ClipReport {
    let bands = match &result.comparison {
        Some(cmp) => {
            let applied = result.applied_gains.unwrap_or(cmp.gains);
            cmp.measured
                .named_levels()
                .zip(FREQUENCY_BANDS.iter())
                .enumerate()
                .map(|(i, ((name, measured_db), band))| BandReport {
                    band: name.to_string(),
                    lower_hz: band.lower_hz,
                    upper_hz: band.upper_hz,
                    measured_db,
                    reference_db: cmp.reference[i],
                    gain_db: cmp.gains[i],
                    applied_gain_db: applied[i],
                })
                .collect()
        }
        None => Vec::new(),
    };

    ClipReport {
        input: result.input.to_string_lossy().to_string(),
        genre: result.genre.to_string(),
        success: result.success,
        output: result
            .output
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        failure: result.failure,
        error: result.error.clone(),
        duration_seconds: result.duration_seconds,
        bands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Comparison;
    use crate::types::{GainVector, GenreKey, SpectralProfile};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn successful() -> EqualizationResult {
        let measured = SpectralProfile::new([-1.0; 10]);
        let reference = SpectralProfile::new([2.0; 10]);
        EqualizationResult {
            input: PathBuf::from("in.wav"),
            genre: GenreKey::new("Rock"),
            success: true,
            output: Some(PathBuf::from("out.wav")),
            failure: None,
            error: None,
            comparison: Some(Comparison {
                measured,
                reference,
                gains: GainVector::new([-3.0; 10]),
            }),
            applied_gains: Some(GainVector::new([-2.0; 10])),
            duration_seconds: 1.5,
        }
    }

    #[test]
    fn test_clip_report_bands() {
        let report = clip_to_json(&successful());
        assert_eq!(report.bands.len(), 10);
        assert_eq!(report.bands[0].band, "sub_bass");
        assert_eq!(report.bands[9].upper_hz, 20000.0);
        assert_eq!(report.bands[3].gain_db, -3.0);
        assert_eq!(report.bands[3].applied_gain_db, -2.0);
    }

    #[test]
    fn test_failed_clip_has_no_bands() {
        let err = GenreqError::unknown_genre("Polka", &[]);
        let result = EqualizationResult::failed(PathBuf::from("in.wav"), GenreKey::new("Polka"), &err);
        let report = clip_to_json(&result);
        assert!(!report.success);
        assert_eq!(report.failure, Some(FailureKind::UnknownGenre));
        assert!(report.bands.is_empty());
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("genreq.json");
        write_report(&[successful()], &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["metadata"]["clip_count"], 1);
        assert_eq!(json["clips"][0]["genre"], "Rock");
        assert_eq!(json["clips"][0]["bands"][0]["band"], "sub_bass");
        assert_eq!(json["clips"][0]["bands"][3]["measured_db"], -1.0);
    }

    /// Accepts nothing: every byte that reaches it is an error
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_pretty_reports_buffered_write_failure() {
        // Small enough to stay in the buffer until the final flush
        let err = write_pretty(FullDisk, &clip_to_json(&successful())).unwrap_err();
        assert!(err.contains("no space left"));
    }
}
