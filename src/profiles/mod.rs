//! Genre reference profile stores
//!
//! A store maps a [`GenreKey`] to exactly one reference [`SpectralProfile`].
//! The comparator only depends on the [`GenreProfileStore`] trait.

pub mod builtin;
pub mod catalog;
pub mod json;

use crate::error::{GenreqError, Result};
use crate::types::{GenreKey, SpectralProfile};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub use builtin::{builtin_catalog, BuiltinProfileStore};
pub use catalog::ProfileCatalog;
pub use json::JsonProfileStore;

/// Catalog file name looked up in the default locations
pub const PROFILES_FILENAME: &str = "profiles.json";

/// Environment variable overriding the catalog location
pub const PROFILES_ENV_VAR: &str = "GENREQ_PROFILES";

/// Source of reference profiles
pub trait GenreProfileStore: Send + Sync {
    /// Reference profile for a genre, if the store knows it
    fn reference_profile(&self, genre: &GenreKey) -> Option<SpectralProfile>;

    /// Genre names in catalog order
    fn genres(&self) -> Vec<String>;

    /// Get the name of this store (for logging)
    fn name(&self) -> &'static str;

    /// Reference profile for a genre, failing with `UnknownGenre`
    fn resolve(&self, genre: &GenreKey) -> Result<SpectralProfile> {
        self.reference_profile(genre)
            .ok_or_else(|| GenreqError::unknown_genre(genre.as_str(), &self.genres()))
    }
}

/// Default catalog path in the per-user config directory
pub fn default_profiles_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "genreq", "genreq")
        .map(|dirs| dirs.config_dir().join(PROFILES_FILENAME))
}

/// Find a catalog file by checking the usual locations
///
/// Search order:
/// 1. `GENREQ_PROFILES` environment variable
/// 2. ProjectDirs config: ~/.config/genreq/profiles.json (Linux)
///    or ~/Library/Application Support/com.genreq.genreq/ (macOS)
/// 3. Current directory: ./profiles.json
pub fn find_profiles_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(PROFILES_ENV_VAR) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Some(path);
        }
        debug!("{} points at missing file {}", PROFILES_ENV_VAR, path.display());
    }

    if let Some(config_path) = default_profiles_path() {
        if config_path.exists() {
            return Some(config_path);
        }
    }

    let local = PathBuf::from(PROFILES_FILENAME);
    if local.exists() {
        return Some(local);
    }

    None
}

/// Open the configured store, or the built-in presets when none is found
///
/// An explicit path must exist; the default locations are optional.
pub fn open_store(explicit: Option<&Path>) -> Result<Arc<dyn GenreProfileStore>> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_profiles_path(),
    };

    match path {
        Some(path) => {
            let store = JsonProfileStore::open(&path)?;
            info!(
                "Using {} genre profiles from {}",
                store.genres().len(),
                path.display()
            );
            Ok(Arc::new(store))
        }
        None => {
            debug!("No profile catalog found, using built-in presets");
            Ok(Arc::new(BuiltinProfileStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_catalog_fails() {
        let result = open_store(Some(Path::new("/nonexistent/genreq/profiles.json")));
        assert!(matches!(result, Err(GenreqError::ProfileStoreError { .. })));
    }

    #[test]
    fn test_explicit_catalog_is_used() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = ProfileCatalog::new();
        catalog.upsert(&GenreKey::new("Shoegaze"), SpectralProfile::new([0.0; 10]));
        JsonProfileStore::with_catalog(&path, catalog).save().unwrap();

        let store = open_store(Some(&path)).unwrap();
        assert_eq!(store.name(), "json");
        assert_eq!(store.genres(), vec!["Shoegaze".to_string()]);
    }
}
