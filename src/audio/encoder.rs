//! WAV export using hound
//!
//! Clips are written at their own sample rate and channel count. Writes go
//! to a temporary sibling file that is renamed into place only after the
//! WAV header has been finalized, so a failed export never leaves a
//! truncated destination behind.

use crate::error::{GenreqError, Result};
use crate::types::AudioClip;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Sample encoding of exported WAV files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    Int16,
    Int24,
    Float32,
}

impl WavFormat {
    /// Pick an encoding close to the decoded source's bit depth
    pub fn for_source(bits_per_sample: Option<u16>) -> Self {
        match bits_per_sample {
            Some(24) => WavFormat::Int24,
            Some(32) | Some(64) => WavFormat::Float32,
            _ => WavFormat::Int16,
        }
    }

    fn spec(self, channels: u16, sample_rate: u32) -> hound::WavSpec {
        let (bits_per_sample, sample_format) = match self {
            WavFormat::Int16 => (16, hound::SampleFormat::Int),
            WavFormat::Int24 => (24, hound::SampleFormat::Int),
            WavFormat::Float32 => (32, hound::SampleFormat::Float),
        };
        hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

impl FromStr for WavFormat {
    type Err = GenreqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "int16" | "16" => Ok(WavFormat::Int16),
            "int24" | "24" => Ok(WavFormat::Int24),
            "float32" | "f32" | "32" => Ok(WavFormat::Float32),
            other => Err(GenreqError::ConfigError(format!(
                "unknown WAV format '{}' (expected int16, int24 or float32)",
                other
            ))),
        }
    }
}

/// Write a clip to a WAV file atomically
pub fn write_wav(clip: &AudioClip, path: &Path, format: WavFormat) -> Result<()> {
    clip.validate()?;
    let channels = u16::try_from(clip.num_channels()).map_err(|_| {
        GenreqError::render_error(format!(
            "{} channels exceed what WAV can store",
            clip.num_channels()
        ))
    })?;

    // Same directory keeps the final rename on one filesystem
    let temp_path = temp_path_for(path);

    if let Err(e) = write_samples(clip, &temp_path, format.spec(channels, clip.sample_rate)) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(GenreqError::OutputError {
            path: path.to_path_buf(),
            reason: e,
        });
    }

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        GenreqError::OutputError {
            path: path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    debug!(
        "Wrote {} frames ({:?}) to {}",
        clip.num_frames(),
        format,
        path.display()
    );
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_samples(clip: &AudioClip, path: &Path, spec: hound::WavSpec) -> std::result::Result<(), String> {
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| format!("Failed to create WAV file: {}", e))?;

    let write_err = |e: hound::Error| format!("Failed to write sample: {}", e);

    for i in 0..clip.num_frames() {
        for channel in &clip.channels {
            let s = channel[i];
            match (spec.sample_format, spec.bits_per_sample) {
                (hound::SampleFormat::Float, _) => writer.write_sample(s).map_err(write_err)?,
                (_, 24) => {
                    let v = (s * 8_388_607.0).clamp(-8_388_608.0, 8_388_607.0) as i32;
                    writer.write_sample(v).map_err(write_err)?
                }
                _ => {
                    let v = (s * 32767.0).clamp(-32768.0, 32767.0) as i16;
                    writer.write_sample(v).map_err(write_err)?
                }
            }
        }
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV: {}", e))
}
