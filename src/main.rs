//! genreq CLI entry point

use clap::Parser;
use genreq::analysis::band_names;
use genreq::config::{Cli, Settings};
use genreq::error::{GenreqError, Result};
use genreq::pipeline;
use genreq::profiles::{self, builtin_catalog, JsonProfileStore};
use genreq::types::{GenreKey, SpectralProfile};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    if cli.list_genres {
        return report(list_genres(&cli));
    }

    if let Some(assignment) = cli.set_profile.as_deref() {
        return report(set_profile(&cli, assignment));
    }

    // Build settings from CLI
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Validate inputs
    if let Err(e) = validate_inputs(&settings) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Run the pipeline
    match pipeline::run(&settings) {
        Ok(result) => {
            for failed in result.results.iter().filter(|r| !r.success) {
                eprintln!(
                    "  {} {}: {}",
                    failed.failure.map(|f| f.to_string()).unwrap_or_default(),
                    failed.input.display(),
                    failed.error.as_deref().unwrap_or("unknown error")
                );
            }

            println!();
            println!(
                "Summary: {} successful, {} failed, {} skipped (of {} total)",
                result.successful, result.failed, result.skipped, result.total_files
            );

            if result.failed > 0 {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = cli.log_level().to_string().to_lowercase();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn report(outcome: Result<()>) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Print the genres of the active catalog with their catalog ids
fn list_genres(cli: &Cli) -> Result<()> {
    let store = profiles::open_store(cli.profiles.as_deref())?;

    println!("Genres ({} store):", store.name());
    println!("      {}", band_names().join(" "));
    for (i, name) in store.genres().iter().enumerate() {
        if let Some(profile) = store.reference_profile(&GenreKey::new(name.as_str())) {
            let levels: Vec<String> = profile.levels().iter().map(|l| format!("{:+.1}", l)).collect();
            println!("  {:>2}. {:<20} {}", i + 1, name, levels.join(" "));
        }
    }
    Ok(())
}

/// Update or add one genre in the JSON catalog, seeding it from the
/// built-in presets when it does not exist yet
fn set_profile(cli: &Cli, assignment: &str) -> Result<()> {
    let (genre, profile) = parse_assignment(assignment)?;

    let path = cli
        .profiles
        .clone()
        .or_else(profiles::find_profiles_path)
        .or_else(profiles::default_profiles_path)
        .ok_or_else(|| {
            GenreqError::ConfigError(
                "could not determine a profile catalog location (use --profiles)".to_string(),
            )
        })?;

    let mut store = if path.exists() {
        JsonProfileStore::open(&path)?
    } else {
        JsonProfileStore::with_catalog(path.clone(), builtin_catalog())
    };

    match store.set_profile(&genre, profile) {
        Some(_) => println!("Updated {} in {}", genre, path.display()),
        None => println!("Added {} to {}", genre, path.display()),
    }
    store.save()
}

/// Parse `GENRE=v1,v2,...,v10`
fn parse_assignment(assignment: &str) -> Result<(GenreKey, SpectralProfile)> {
    let (name, levels) = assignment.split_once('=').ok_or_else(|| {
        GenreqError::ConfigError(format!(
            "expected GENRE=LEVELS, got '{}'\n\n  Example: --set-profile \"Rock=2,3,2,1,0,-1,-2,-2,-3,-4\"",
            assignment
        ))
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(GenreqError::ConfigError("genre name is empty".to_string()));
    }

    let levels = levels
        .split(',')
        .map(|v| {
            v.trim().parse::<f32>().map_err(|_| {
                GenreqError::ConfigError(format!("'{}' is not a dB level", v.trim()))
            })
        })
        .collect::<Result<Vec<f32>>>()?;

    Ok((GenreKey::new(name), SpectralProfile::from_slice(&levels)?))
}

fn validate_inputs(settings: &Settings) -> std::result::Result<(), String> {
    // Check input exists
    if !settings.input.exists() {
        return Err(format!(
            "Input path does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Examples:\n    genreq -i ./clip.mp3 -o ./clip_rock.wav -g Rock\n    genreq -i ~/Music/demos -o ./equalized -g Hip-Hop",
            settings.input.display()
        ));
    }

    if settings.genre.is_none() {
        return Err(
            "No target genre given.\n\n  Tip: Pick one with --genre; list the available ones with --list-genres."
                .to_string(),
        );
    }

    // Check output parent directory exists (we'll create the output dir itself)
    if let Some(parent) = settings.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!(
                "Output parent directory does not exist: {}\n\n  Tip: The output directory will be created automatically,\n  but its parent directory must exist.\n  Example: mkdir -p {}",
                parent.display(),
                parent.display()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let (genre, profile) = parse_assignment("Lo-Fi = 1, 2,3,4,5,6,7,8,9,-10").unwrap();
        assert_eq!(genre.as_str(), "Lo-Fi");
        assert_eq!(profile[9], -10.0);
    }

    #[test]
    fn test_parse_assignment_rejects_bad_input() {
        assert!(parse_assignment("Rock").is_err());
        assert!(parse_assignment("=1,2,3,4,5,6,7,8,9,10").is_err());
        assert!(parse_assignment("Rock=1,2,3").is_err());
        assert!(parse_assignment("Rock=1,2,3,4,5,6,7,8,9,loud").is_err());
    }
}
