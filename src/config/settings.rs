//! Runtime configuration settings

use crate::audio::WavFormat;
use crate::error::{GenreqError, Result};
use crate::types::{GainLimit, GenreKey};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Where transform work runs
///
/// The choice only affects wall-clock time, never results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeBackend {
    /// Parallel when the worker pool has more than one thread, else CPU
    Auto,
    /// Single-threaded
    Cpu,
    /// Spread STFT frames and band scans over the rayon pool
    Parallel,
}

impl ComputeBackend {
    /// Apply the capability check, falling back to CPU when parallel work
    /// cannot help
    pub fn resolve(self) -> Self {
        match self {
            ComputeBackend::Cpu => ComputeBackend::Cpu,
            ComputeBackend::Auto | ComputeBackend::Parallel => {
                let workers = rayon::current_num_threads();
                if workers > 1 {
                    ComputeBackend::Parallel
                } else {
                    if self == ComputeBackend::Parallel {
                        debug!("Parallel backend requested with {} worker, using CPU", workers);
                    }
                    ComputeBackend::Cpu
                }
            }
        }
    }
}

impl FromStr for ComputeBackend {
    type Err = GenreqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ComputeBackend::Auto),
            "cpu" => Ok(ComputeBackend::Cpu),
            "parallel" => Ok(ComputeBackend::Parallel),
            other => Err(GenreqError::ConfigError(format!(
                "unknown backend '{}' (expected auto, cpu or parallel)",
                other
            ))),
        }
    }
}

/// Runtime settings for the equalization pipeline
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input path (file or directory)
    pub input: PathBuf,
    /// Output WAV file, or directory for batch output
    pub output: PathBuf,
    /// Target genre
    pub genre: Option<GenreKey>,
    /// Explicit genre profile catalog
    pub profiles_path: Option<PathBuf>,
    /// Clamp applied to gains before rendering
    pub gain_limit: Option<GainLimit>,
    /// Transform backend
    pub backend: ComputeBackend,
    /// Output encoding; `None` follows the source bit depth
    pub output_format: Option<WavFormat>,
    /// Write the JSON diagnostics report
    pub write_report: bool,
    /// Number of clips equalized concurrently in batch mode
    pub threads: usize,
    /// Scan recursively
    pub recursive: bool,
    /// Overwrite existing outputs
    pub force: bool,
    /// Show progress bars
    pub show_progress: bool,
    /// Dry run mode - show files without processing
    pub dry_run: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Result<Self> {
        let threads = cli
            .threads
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1).max(1));

        let gain_limit = match (cli.min_gain_db, cli.max_gain_db) {
            (None, None) => None,
            (min, max) => Some(GainLimit::new(
                min.unwrap_or(f32::MIN),
                max.unwrap_or(f32::MAX),
            )?),
        };

        let output_format = cli.format.as_deref().map(WavFormat::from_str).transpose()?;

        let defaults = Self::default();
        Ok(Self {
            input: cli.input.clone().unwrap_or(defaults.input),
            output: cli.output.clone().unwrap_or(defaults.output),
            genre: cli.genre.as_deref().map(GenreKey::from),
            profiles_path: cli.profiles.clone(),
            gain_limit,
            backend: cli.backend.parse()?,
            output_format,
            write_report: !cli.no_report,
            threads,
            recursive: !cli.no_recursive,
            force: cli.force,
            show_progress: !cli.quiet,
            dry_run: cli.dry_run,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            output: PathBuf::from("./output"),
            genre: None,
            profiles_path: None,
            gain_limit: None,
            backend: ComputeBackend::Auto,
            output_format: None,
            write_report: true,
            threads: num_cpus::get().saturating_sub(1).max(1),
            recursive: true,
            force: false,
            show_progress: true,
            dry_run: false,
        }
    }
}
