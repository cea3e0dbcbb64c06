//! Ordered genre → reference profile table shared by the stores

use super::GenreProfileStore;
use crate::types::{GenreKey, SpectralProfile};

/// Ordered list of genres and their reference profiles
///
/// Lookups are case-insensitive on the genre name. A key made of digits
/// selects the entry by its 1-based catalog id, matching how genre ids are
/// numbered in preset catalogs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileCatalog {
    entries: Vec<(String, SpectralProfile)>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an entry's position by name or catalog id
    fn position(&self, genre: &GenreKey) -> Option<usize> {
        let wanted = genre.normalized();
        if let Some(i) = self
            .entries
            .iter()
            .position(|(name, _)| name.trim().to_lowercase() == wanted)
        {
            return Some(i);
        }

        match wanted.parse::<usize>() {
            Ok(id) if id >= 1 && id <= self.entries.len() => Some(id - 1),
            _ => None,
        }
    }

    pub fn get(&self, genre: &GenreKey) -> Option<SpectralProfile> {
        self.position(genre).map(|i| self.entries[i].1)
    }

    /// Insert a genre, or replace the levels of an existing one
    ///
    /// Returns the previous profile when one was replaced. Replacing keeps the
    /// entry's original name and catalog id.
    pub fn upsert(&mut self, genre: &GenreKey, profile: SpectralProfile) -> Option<SpectralProfile> {
        match self
            .entries
            .iter()
            .position(|(name, _)| name.trim().to_lowercase() == genre.normalized())
        {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, profile)),
            None => {
                self.entries.push((genre.as_str().trim().to_string(), profile));
                None
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpectralProfile)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, SpectralProfile)> for ProfileCatalog {
    fn from_iter<I: IntoIterator<Item = (String, SpectralProfile)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (name, profile) in iter {
            catalog.upsert(&GenreKey::new(name), profile);
        }
        catalog
    }
}

impl GenreProfileStore for ProfileCatalog {
    fn reference_profile(&self, genre: &GenreKey) -> Option<SpectralProfile> {
        self.get(genre)
    }

    fn genres(&self) -> Vec<String> {
        self.names()
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}
