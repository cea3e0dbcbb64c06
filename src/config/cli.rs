//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// genreq - Genre-matched spectral equalization
///
/// Measures a ten-band loudness fingerprint of each clip, compares it with
/// the reference profile of the chosen genre and renders an equalized WAV.
#[derive(Parser, Debug)]
#[command(name = "genreq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input path (file or directory)
    #[arg(short, long, value_name = "PATH")]
    #[arg(required_unless_present_any = ["list_genres", "set_profile"])]
    pub input: Option<PathBuf>,

    /// Output WAV file (single input) or directory
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Target genre (name, or catalog id such as 5)
    #[arg(short, long, value_name = "GENRE")]
    pub genre: Option<String>,

    /// Genre profile catalog (JSON); defaults to $GENREQ_PROFILES, the user
    /// config directory, ./profiles.json, then the built-in presets
    #[arg(long, value_name = "FILE")]
    pub profiles: Option<PathBuf>,

    /// List the genres of the active profile catalog and exit
    #[arg(long, default_value = "false")]
    pub list_genres: bool,

    /// Update or add a genre in the profile catalog:
    /// "GENRE=sub_bass,bass,lower_midrange,midrange,upper_midrange,low_treble,treble,presence,brilliance,air"
    #[arg(long, value_name = "GENRE=LEVELS", allow_hyphen_values = true)]
    pub set_profile: Option<String>,

    /// Lowest gain correction applied to any band (dB)
    #[arg(long, value_name = "DB", allow_negative_numbers = true)]
    pub min_gain_db: Option<f32>,

    /// Highest gain correction applied to any band (dB)
    #[arg(long, value_name = "DB", allow_negative_numbers = true)]
    pub max_gain_db: Option<f32>,

    /// Transform backend
    #[arg(long, value_name = "BACKEND", default_value = "auto")]
    #[arg(value_parser = ["auto", "cpu", "parallel"])]
    pub backend: String,

    /// Output sample format (defaults to the source bit depth)
    #[arg(long, value_name = "FORMAT")]
    #[arg(value_parser = ["int16", "int24", "float32"])]
    pub format: Option<String>,

    /// Skip writing the genreq.json diagnostics report
    #[arg(long, default_value = "false")]
    pub no_report: bool,

    /// Number of clips equalized concurrently (defaults to CPU count - 1)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Only scan the top level of an input directory
    #[arg(long, default_value = "false")]
    pub no_recursive: bool,

    /// Overwrite existing output files
    #[arg(long, default_value = "false")]
    pub force: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Dry run - show files that would be equalized without processing
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
