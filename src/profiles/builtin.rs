//! Built-in reference profiles
//!
//! Used when no profile catalog file is configured.

use super::catalog::ProfileCatalog;
use super::GenreProfileStore;
use crate::analysis::bands::NUM_BANDS;
use crate::types::{GenreKey, SpectralProfile};

/// Preset levels in dB, sub_bass through air
pub const BUILTIN_PRESETS: [(&str, [f32; NUM_BANDS]); 10] = [
    ("Electronic", [5.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0]),
    ("Rock", [3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0, -5.0, -6.0]),
    ("Punk", [2.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0, -5.0]),
    ("Experimental", [1.0, 0.0, -1.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0, -8.0]),
    ("Hip-Hop", [4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0, -5.0]),
    ("Folk", [0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0]),
    ("Chiptune / Glitch", [-2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0]),
    ("Instrumental", [1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0]),
    ("Pop", [3.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0]),
    ("International", [2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0]),
];

/// Read-only store over [`BUILTIN_PRESETS`]
#[derive(Debug, Clone)]
pub struct BuiltinProfileStore {
    catalog: ProfileCatalog,
}

impl BuiltinProfileStore {
    pub fn new() -> Self {
        Self {
            catalog: builtin_catalog(),
        }
    }
}

impl Default for BuiltinProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable copy of the presets, e.g. to seed a catalog file
pub fn builtin_catalog() -> ProfileCatalog {
    BUILTIN_PRESETS
        .iter()
        .map(|(name, levels)| (name.to_string(), SpectralProfile::new(*levels)))
        .collect()
}

impl GenreProfileStore for BuiltinProfileStore {
    fn reference_profile(&self, genre: &GenreKey) -> Option<SpectralProfile> {
        self.catalog.get(genre)
    }

    fn genres(&self) -> Vec<String> {
        self.catalog.names()
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_ten_genres() {
        let store = BuiltinProfileStore::new();
        assert_eq!(store.genres().len(), 10);
        assert_eq!(store.genres()[0], "Electronic");
    }

    #[test]
    fn test_hip_hop_reference() {
        let store = BuiltinProfileStore::new();
        let profile = store.reference_profile(&GenreKey::new("Hip-Hop")).unwrap();
        assert_eq!(
            profile.levels(),
            &[4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0, -4.0, -5.0]
        );
        // Catalog id 5 is Hip-Hop
        assert_eq!(store.reference_profile(&GenreKey::new("5")), Some(profile));
    }

    #[test]
    fn test_resolve_unknown_genre_fails() {
        let store = BuiltinProfileStore::new();
        let err = store.resolve(&GenreKey::new("Polka")).unwrap_err();
        assert!(err.to_string().contains("Electronic"));
    }
}
