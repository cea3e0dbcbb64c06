//! Profile comparison
//!
//! Turns a measured fingerprint and a genre's reference fingerprint into the
//! per-band gain corrections handed to the renderer.

use crate::error::Result;
use crate::profiles::GenreProfileStore;
use crate::types::{GainVector, GenreKey, SpectralProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// The measured/reference/gain triple behind one correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub measured: SpectralProfile,
    pub reference: SpectralProfile,
    pub gains: GainVector,
}

/// Resolves reference profiles and derives gain vectors
#[derive(Clone)]
pub struct ProfileComparator {
    store: Arc<dyn GenreProfileStore>,
}

impl ProfileComparator {
    pub fn new(store: Arc<dyn GenreProfileStore>) -> Self {
        Self { store }
    }

    /// Compare a measured profile with the reference stored for `genre`
    pub fn compare(&self, measured: &SpectralProfile, genre: &GenreKey) -> Result<Comparison> {
        let reference = self.store.resolve(genre)?;
        let gains = gain_vector(measured, &reference);

        debug!(
            "Compared against '{}' ({}): gains {:?}",
            genre,
            self.store.name(),
            gains.gains()
        );

        Ok(Comparison {
            measured: *measured,
            reference,
            gains,
        })
    }
}

impl std::fmt::Debug for ProfileComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileComparator")
            .field("store", &self.store.name())
            .finish()
    }
}

/// Elementwise `measured - reference`
pub fn gain_vector(measured: &SpectralProfile, reference: &SpectralProfile) -> GainVector {
    let m = measured.levels();
    let r = reference.levels();
    GainVector::new(std::array::from_fn(|i| m[i] - r[i]))
}
