//! File-backed genre profile catalog
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "genres": [
//!     { "genre": "Hip-Hop",
//!       "levels": { "sub_bass": 4, "bass": 3, "lower_midrange": 2, "midrange": 1,
//!                   "upper_midrange": 0, "low_treble": -1, "treble": -2,
//!                   "presence": -3, "brilliance": -4, "air": -5 } }
//!   ]
//! }
//! ```

use super::catalog::ProfileCatalog;
use super::GenreProfileStore;
use crate::error::{GenreqError, Result};
use crate::export::json::write_pretty;
use crate::types::{GenreKey, SpectralProfile};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Catalog file schema version
const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
struct CatalogJson {
    version: String,
    genres: Vec<GenreJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GenreJson {
    genre: String,
    levels: BandLevelsJson,
}

/// One field per band, so missing or misspelled bands fail to parse
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BandLevelsJson {
    sub_bass: f32,
    bass: f32,
    lower_midrange: f32,
    midrange: f32,
    upper_midrange: f32,
    low_treble: f32,
    treble: f32,
    presence: f32,
    brilliance: f32,
    air: f32,
}

impl BandLevelsJson {
    fn to_array(&self) -> [f32; 10] {
        [
            self.sub_bass,
            self.bass,
            self.lower_midrange,
            self.midrange,
            self.upper_midrange,
            self.low_treble,
            self.treble,
            self.presence,
            self.brilliance,
            self.air,
        ]
    }

    fn from_profile(profile: &SpectralProfile) -> Self {
        let l = profile.levels();
        Self {
            sub_bass: l[0],
            bass: l[1],
            lower_midrange: l[2],
            midrange: l[3],
            upper_midrange: l[4],
            low_treble: l[5],
            treble: l[6],
            presence: l[7],
            brilliance: l[8],
            air: l[9],
        }
    }
}

/// Genre catalog loaded from (and savable to) a JSON file
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    path: PathBuf,
    catalog: ProfileCatalog,
}

impl JsonProfileStore {
    /// Load and validate a catalog file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| store_error(path, format!("cannot open: {}", e)))?;
        let json: CatalogJson = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| store_error(path, format!("cannot parse: {}", e)))?;

        if json.version != SCHEMA_VERSION {
            debug!(
                "Catalog {} has schema version {}, expected {}",
                path.display(),
                json.version,
                SCHEMA_VERSION
            );
        }

        let mut catalog = ProfileCatalog::new();
        for entry in json.genres {
            let key = GenreKey::new(entry.genre.clone());
            if key.normalized().is_empty() {
                return Err(store_error(path, "genre name is empty"));
            }
            let profile = SpectralProfile::from_slice(&entry.levels.to_array())
                .map_err(|e| store_error(path, format!("genre '{}': {}", entry.genre, e)))?;
            if catalog.upsert(&key, profile).is_some() {
                return Err(store_error(
                    path,
                    format!("genre '{}' is listed more than once", entry.genre),
                ));
            }
        }

        debug!("Loaded {} genre profiles from {}", catalog.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            catalog,
        })
    }

    /// Create a store at `path` holding the given catalog (not yet saved)
    pub fn with_catalog(path: impl Into<PathBuf>, catalog: ProfileCatalog) -> Self {
        Self {
            path: path.into(),
            catalog,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    /// Update a genre's reference levels, adding the genre if it is new
    pub fn set_profile(&mut self, genre: &GenreKey, profile: SpectralProfile) -> Option<SpectralProfile> {
        let previous = self.catalog.upsert(genre, profile);
        info!(
            "{} reference profile for '{}'",
            if previous.is_some() { "Updated" } else { "Added" },
            genre
        );
        previous
    }

    /// Write the catalog back to its file
    ///
    /// Uses atomic write pattern: writes to a temp file first, then renames.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| GenreqError::output_error(parent, e))?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        let file = File::create(&temp_path).map_err(|e| GenreqError::OutputError {
            path: self.path.clone(),
            reason: format!("Failed to create temp file: {}", e),
        })?;

        let output = CatalogJson {
            version: SCHEMA_VERSION.to_string(),
            genres: self
                .catalog
                .iter()
                .map(|(name, profile)| GenreJson {
                    genre: name.to_string(),
                    levels: BandLevelsJson::from_profile(profile),
                })
                .collect(),
        };

        write_pretty(file, &output).map_err(|reason| {
            let _ = std::fs::remove_file(&temp_path);
            GenreqError::OutputError {
                path: self.path.clone(),
                reason,
            }
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            GenreqError::OutputError {
                path: self.path.clone(),
                reason: format!("Failed to finalize file: {}", e),
            }
        })?;

        info!(
            "Wrote {} genre profiles to {}",
            self.catalog.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl GenreProfileStore for JsonProfileStore {
    fn reference_profile(&self, genre: &GenreKey) -> Option<SpectralProfile> {
        self.catalog.get(genre)
    }

    fn genres(&self) -> Vec<String> {
        self.catalog.names()
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

fn store_error(path: &Path, reason: impl Into<String>) -> GenreqError {
    GenreqError::ProfileStoreError {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
