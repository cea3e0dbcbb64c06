//! File discovery and scanning

use crate::error::{GenreqError, Result};
use crate::types::{AudioFormat, GenreKey};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Discovered audio file with basic metadata
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub size_bytes: u64,
}

/// Scan a path (file or directory) for audio files
///
/// Files under `exclude` (typically the output directory) are skipped so
/// rendered clips are not fed back in. Results are sorted by path.
pub fn scan(input: &Path, recursive: bool, exclude: Option<&Path>) -> Result<Vec<DiscoveredFile>> {
    if !input.exists() {
        return Err(GenreqError::FileNotFound(input.to_path_buf()));
    }

    let mut files = Vec::new();

    if input.is_file() {
        // Single file mode
        if let Some(file) = try_discover_file(input) {
            files.push(file);
        } else {
            return Err(GenreqError::UnsupportedFormat {
                path: input.to_path_buf(),
                format: input
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
    } else if input.is_dir() {
        // Directory mode
        let walker = if recursive {
            WalkDir::new(input)
        } else {
            WalkDir::new(input).max_depth(1)
        };

        let walker = walker.into_iter().filter_entry(|e| match exclude {
            Some(excluded) => !e.path().starts_with(excluded) || e.path() == input,
            None => true,
        });

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() {
                if let Some(file) = try_discover_file(path) {
                    debug!("Discovered: {}", file.path.display());
                    files.push(file);
                }
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    info!("Discovered {} audio files", files.len());

    if files.is_empty() {
        warn!("No supported audio files found in {}", input.display());
    }

    Ok(files)
}

/// Try to create a DiscoveredFile if the path is a supported audio format
fn try_discover_file(path: &Path) -> Option<DiscoveredFile> {
    let ext = path.extension()?.to_str()?;
    let format = AudioFormat::from_extension(ext)?;

    let metadata = std::fs::metadata(path).ok()?;
    let size_bytes = metadata.len();

    Some(DiscoveredFile {
        path: path.to_path_buf(),
        format,
        size_bytes,
    })
}

/// Destination of the equalized clip for `file` in batch mode
///
/// Mirrors the file's location below `input_root` inside `output_dir` and
/// names it `<stem>_<genre>.wav`.
pub fn output_path_for(file: &Path, input_root: &Path, output_dir: &Path, genre: &GenreKey) -> PathBuf {
    let relative_dir = file
        .parent()
        .and_then(|parent| parent.strip_prefix(input_root).ok())
        .unwrap_or_else(|| Path::new(""));

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());

    output_dir
        .join(relative_dir)
        .join(format!("{}_{}.wav", stem, genre.slug()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"not really audio").unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("b.wav"));
        touch(&dir.path().join("a.flac"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("sub").join("c.mp3"));

        let files = scan(dir.path(), true, None).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.flac", "b.wav", "c.mp3"]);

        let top_level = scan(dir.path(), false, None).unwrap();
        assert_eq!(top_level.len(), 2);
    }

    #[test]
    fn test_scan_skips_excluded_directory() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.wav"));
        touch(&dir.path().join("out").join("a_rock.wav"));

        let files = scan(dir.path(), true, Some(&dir.path().join("out"))).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_scan_single_unsupported_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        touch(&path);
        assert!(matches!(
            scan(&path, true, None),
            Err(GenreqError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_scan_missing_input() {
        assert!(matches!(
            scan(Path::new("/nonexistent/music"), true, None),
            Err(GenreqError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_output_path_mirrors_layout() {
        let out = output_path_for(
            Path::new("/music/albums/one/track.mp3"),
            Path::new("/music"),
            Path::new("/eq"),
            &GenreKey::new("Hip-Hop"),
        );
        assert_eq!(out, PathBuf::from("/eq/albums/one/track_hip-hop.wav"));
    }
}
