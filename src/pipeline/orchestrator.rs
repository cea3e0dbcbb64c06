//! Pipeline orchestration
//!
//! Coordinates discovery, concurrent equalization and the diagnostics
//! report. Each clip is equalized independently and owns its accumulator.

use super::equalizer::Equalizer;
use crate::config::Settings;
use crate::discovery::{self, DiscoveredFile};
use crate::error::{GenreqError, Result};
use crate::export;
use crate::types::{EqualizationResult, GenreKey};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Diagnostics report file name
pub const REPORT_FILENAME: &str = "genreq.json";

/// Pipeline result summary
#[derive(Debug)]
pub struct PipelineResult {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    /// Files whose destination already existed
    pub skipped: usize,
    /// Per-clip outcomes, in discovery order
    pub results: Vec<EqualizationResult>,
}

impl PipelineResult {
    fn empty(total_files: usize, skipped: usize) -> Self {
        Self {
            total_files,
            successful: 0,
            failed: 0,
            skipped,
            results: Vec::new(),
        }
    }
}

/// One clip and where its equalized version goes
#[derive(Debug, Clone)]
struct Job {
    file: DiscoveredFile,
    destination: PathBuf,
    /// Earlier input that already writes `destination`
    conflicts_with: Option<PathBuf>,
}

/// Run the full equalization pipeline
pub fn run(settings: &Settings) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    let genre = settings
        .genre
        .clone()
        .ok_or_else(|| GenreqError::ConfigError("no target genre given (use --genre)".to_string()))?;

    configure_thread_pool(settings.threads)?;

    // Phase 1: Discovery
    let discovery_start = Instant::now();
    info!("Scanning for audio files...");
    let single_file = settings.input.is_file();
    let exclude = if single_file { None } else { Some(settings.output.as_path()) };
    let files = discovery::scan(&settings.input, settings.recursive, exclude)?;

    if files.is_empty() {
        return Ok(PipelineResult::empty(0, 0));
    }

    info!(
        "Found {} audio files in {:.2}s",
        files.len(),
        discovery_start.elapsed().as_secs_f64()
    );

    let jobs = plan_jobs(files, settings, &genre, single_file);

    // Dry run mode - show files and exit
    if settings.dry_run {
        return Ok(run_dry_run(&jobs, settings, &genre));
    }

    let (jobs, existing): (Vec<_>, Vec<_>) = jobs.into_iter().partition(|job| {
        if !settings.force && job.destination.exists() {
            debug!("Skipping {} (output exists)", job.file.path.display());
            false
        } else {
            true
        }
    });

    let skipped = existing.len();
    if skipped > 0 {
        info!(
            "Skipping {} already-equalized files (use --force to overwrite)",
            skipped
        );
    }

    let total_files = jobs.len() + skipped;
    if jobs.is_empty() {
        info!("All files already equalized, nothing to do");
        return Ok(PipelineResult::empty(total_files, skipped));
    }

    let equalizer = Equalizer::from_settings(settings)?;
    debug!("Using {:?}", equalizer);

    // Phase 2: Equalization
    info!("Equalizing {} files as {}", jobs.len(), genre);
    let equalize_start = Instant::now();
    let results = equalize_jobs(&jobs, &equalizer, &genre, settings.show_progress);
    let elapsed = equalize_start.elapsed().as_secs_f64();
    let clips_per_sec = if elapsed > 0.0 {
        jobs.len() as f64 / elapsed
    } else {
        0.0
    };
    info!(
        "Equalization completed in {:.2}s ({:.1} clips/sec)",
        elapsed, clips_per_sec
    );

    // Phase 3: Report
    if settings.write_report {
        let report_path = report_path(settings, single_file);
        if let Some(parent) = report_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| GenreqError::output_error(&report_path, e))?;
            }
        }
        export::write_report(&results, &report_path)?;
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    let successful = results.iter().filter(|r| r.success).count();
    Ok(PipelineResult {
        total_files,
        successful,
        failed: results.len() - successful,
        skipped,
        results,
    })
}

/// Pair every discovered file with its destination
///
/// A single input file may be written to an exact `.wav` path; otherwise
/// the output is a directory mirroring the input layout. No two jobs write
/// the same destination.
fn plan_jobs(
    files: Vec<DiscoveredFile>,
    settings: &Settings,
    genre: &GenreKey,
    single_file: bool,
) -> Vec<Job> {
    let input_root = if single_file {
        settings.input.parent().unwrap_or_else(|| Path::new(""))
    } else {
        settings.input.as_path()
    };

    let mut jobs: Vec<Job> = files
        .into_iter()
        .map(|file| {
            let destination = if single_file && is_wav_path(&settings.output) {
                settings.output.clone()
            } else {
                discovery::output_path_for(&file.path, input_root, &settings.output, genre)
            };
            Job {
                file,
                destination,
                conflicts_with: None,
            }
        })
        .collect();

    disambiguate_destinations(&mut jobs, genre);
    jobs
}

/// Same-stem inputs of one directory (`a.mp3`, `a.wav`) would share
/// `a_<genre>.wav`; those get the source format inserted instead
/// (`a_mp3_<genre>.wav`). A destination still shared after that stays with
/// the first job and the later ones are marked as conflicting.
fn disambiguate_destinations(jobs: &mut [Job], genre: &GenreKey) {
    let mut claims: HashMap<PathBuf, usize> = HashMap::new();
    for job in jobs.iter() {
        *claims.entry(job.destination.clone()).or_default() += 1;
    }

    for job in jobs.iter_mut() {
        if claims.get(&job.destination).copied().unwrap_or(0) > 1 {
            let stem = job
                .file
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "clip".to_string());
            let renamed = format!("{}_{}_{}.wav", stem, job.file.format.tag(), genre.slug());
            debug!(
                "{} shares its destination, writing {} instead",
                job.file.path.display(),
                renamed
            );
            job.destination.set_file_name(renamed);
        }
    }

    let mut owners: HashMap<PathBuf, PathBuf> = HashMap::new();
    for job in jobs.iter_mut() {
        match owners.get(&job.destination) {
            Some(owner) => {
                warn!(
                    "{} and {} map to the same output {}",
                    owner.display(),
                    job.file.path.display(),
                    job.destination.display()
                );
                job.conflicts_with = Some(owner.clone());
            }
            None => {
                owners.insert(job.destination.clone(), job.file.path.clone());
            }
        }
    }
}

fn is_wav_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Report lives next to an exact output file, or inside the output directory
fn report_path(settings: &Settings, single_file: bool) -> PathBuf {
    if single_file && is_wav_path(&settings.output) {
        settings
            .output
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(REPORT_FILENAME)
    } else {
        settings.output.join(REPORT_FILENAME)
    }
}

/// Equalize jobs concurrently, preserving job order in the results
fn equalize_jobs(
    jobs: &[Job],
    equalizer: &Equalizer,
    genre: &GenreKey,
    show_progress: bool,
) -> Vec<EqualizationResult> {
    let progress_bar = if show_progress {
        let pb = ProgressBar::new(jobs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results: Vec<EqualizationResult> = jobs
        .par_iter()
        .map(|job| {
            let result = match &job.conflicts_with {
                Some(owner) => {
                    let err = GenreqError::OutputError {
                        path: job.destination.clone(),
                        reason: format!("destination already claimed by {}", owner.display()),
                    };
                    EqualizationResult::failed(job.file.path.clone(), genre.clone(), &err)
                }
                None => equalizer.equalize_file(&job.file.path, &job.destination, genre),
            };
            if let Some(ref pb) = progress_bar {
                pb.inc(1);
                pb.set_message(
                    job.file
                        .path
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string(),
                );
            }
            result
        })
        .collect();

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Equalization complete");
    }

    results
}

/// Dry run mode - show files that would be equalized without processing
fn run_dry_run(jobs: &[Job], settings: &Settings, genre: &GenreKey) -> PipelineResult {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    let mut pending = 0;
    let mut formats: BTreeMap<&'static str, usize> = BTreeMap::new();
    for job in jobs {
        *formats.entry(job.file.format.tag()).or_default() += 1;
        let exists = job.destination.exists();
        let marker = if job.conflicts_with.is_some() {
            "  !!"
        } else if exists && !settings.force {
            "skip"
        } else {
            pending += 1;
            "  ->"
        };
        println!(
            "{} ({:.1} MB)",
            job.file.path.display(),
            job.file.size_bytes as f64 / (1024.0 * 1024.0)
        );
        println!("  {} {}", marker, job.destination.display());
    }

    println!();
    println!("─────────────────────────────────────────");
    println!();
    println!("Would equalize {} of {} files as {}", pending, jobs.len(), genre);
    let breakdown: Vec<String> = formats
        .iter()
        .map(|(format, count)| format!("{} {}", count, format))
        .collect();
    println!("Formats: {}", breakdown.join(", "));
    let conflicts = jobs.iter().filter(|job| job.conflicts_with.is_some()).count();
    if conflicts > 0 {
        println!("{} files would fail: output already claimed by another input", conflicts);
    }
    if settings.write_report {
        println!(
            "Would write report to {}",
            report_path(settings, settings.input.is_file()).display()
        );
    }
    println!();

    PipelineResult::empty(jobs.len(), jobs.len())
}

/// Configure the Rayon thread pool
fn configure_thread_pool(num_threads: usize) -> Result<()> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => {
            debug!("Configured thread pool with {} threads", num_threads);
        }
        Err(e) => {
            // Already initialized (e.g., by an earlier run in the same process)
            if e.to_string().contains("already been initialized") {
                debug!("Thread pool already initialized, using existing pool");
            } else {
                return Err(GenreqError::ConfigError(format!(
                    "Failed to configure thread pool: {}",
                    e
                )));
            }
        }
    }
    Ok(())
}
