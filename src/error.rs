//! Unified error types for genreq
//!
//! Error strategy:
//! - Per-clip errors (decode, analysis, unknown genre, render): recoverable in
//!   batch mode, skip the clip and continue
//! - System errors (output, profile store, configuration): fatal, abort batch
//!
//! Every error maps onto one of the four failure classes reported to callers
//! (see [`FailureKind`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC, AIFF";

/// Top-level error type for genreq operations
#[derive(Debug, Error)]
pub enum GenreqError {
    // =========================================================================
    // Analysis failures - the clip cannot be fingerprinted
    // =========================================================================
    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}\n  Tip: If the file plays in other apps, it may be corrupted or use an unsupported codec")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Unsupported audio format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("Analysis failed for '{path}': {reason}")]
    AnalysisError { path: PathBuf, reason: String },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Comparison failures
    // =========================================================================
    #[error("Unknown genre '{genre}'\n  Available genres: {available}\n  Tip: Run with --list-genres to see every reference profile")]
    UnknownGenre { genre: String, available: String },

    #[error("Invalid spectral profile: {reason}")]
    InvalidProfile { reason: String },

    // =========================================================================
    // Render failures
    // =========================================================================
    #[error("Rendering failed: {reason}")]
    RenderError { reason: String },

    // =========================================================================
    // Fatal errors - abort entire batch
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Genre profile store '{path}' is unusable: {reason}\n  Tip: Each genre needs exactly ten band levels (sub_bass .. air)")]
    ProfileStoreError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for genreq operations
pub type Result<T> = std::result::Result<T, GenreqError>;

/// Failure classification surfaced to callers alongside a boolean outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Clip could not be decoded, was empty, or the transform failed
    Analysis,
    /// Genre key did not resolve to a reference profile
    UnknownGenre,
    /// Filtering could not be applied to the accumulator
    Render,
    /// Final clip could not be written
    Export,
    /// Settings or profile catalog problems outside the equalization core
    Configuration,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Analysis => "AnalysisFailure",
            FailureKind::UnknownGenre => "UnknownGenre",
            FailureKind::Render => "RenderFailure",
            FailureKind::Export => "ExportFailure",
            FailureKind::Configuration => "ConfigurationFailure",
        };
        f.write_str(name)
    }
}

impl GenreqError {
    /// Classify this error into the caller-facing failure taxonomy
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            GenreqError::DecodeError { .. }
            | GenreqError::UnsupportedFormat { .. }
            | GenreqError::AnalysisError { .. }
            | GenreqError::FileNotFound(_) => FailureKind::Analysis,
            GenreqError::UnknownGenre { .. } => FailureKind::UnknownGenre,
            GenreqError::RenderError { .. } => FailureKind::Render,
            GenreqError::OutputError { .. } | GenreqError::Io(_) => FailureKind::Export,
            GenreqError::InvalidProfile { .. }
            | GenreqError::ProfileStoreError { .. }
            | GenreqError::ConfigError(_) => FailureKind::Configuration,
        }
    }

    /// Returns true if this error is recoverable (should skip clip, continue batch)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.failure_kind(),
            FailureKind::Analysis | FailureKind::UnknownGenre | FailureKind::Render
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GenreqError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a render error
    pub fn render_error(reason: impl Into<String>) -> Self {
        GenreqError::RenderError {
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            std::io::ErrorKind::AlreadyExists => {
                format!("File already exists: {}", path.display())
            }
            _ => err.to_string(),
        };
        GenreqError::OutputError { path, reason }
    }

    /// Create an unknown-genre error listing the genres that do exist
    pub fn unknown_genre(genre: impl Into<String>, available: &[String]) -> Self {
        GenreqError::UnknownGenre {
            genre: genre.into(),
            available: if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            GenreqError::decode_error("a.wav", "bad").failure_kind(),
            FailureKind::Analysis
        );
        assert_eq!(
            GenreqError::unknown_genre("Polka", &[]).failure_kind(),
            FailureKind::UnknownGenre
        );
        assert_eq!(
            GenreqError::render_error("no channels").failure_kind(),
            FailureKind::Render
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            GenreqError::output_error("/x/y.wav", io).failure_kind(),
            FailureKind::Export
        );
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(GenreqError::FileNotFound(PathBuf::from("x")).is_recoverable());
        assert!(GenreqError::unknown_genre("Polka", &[]).is_recoverable());
        assert!(!GenreqError::ConfigError("bad".into()).is_recoverable());
        assert!(!GenreqError::OutputError {
            path: PathBuf::from("x"),
            reason: "full".into()
        }
        .is_recoverable());
    }

    #[test]
    fn test_unknown_genre_lists_available() {
        let err = GenreqError::unknown_genre("Polka", &["Rock".to_string(), "Pop".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("Polka"));
        assert!(msg.contains("Rock, Pop"));
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Analysis.to_string(), "AnalysisFailure");
        assert_eq!(FailureKind::Export.to_string(), "ExportFailure");
    }
}
