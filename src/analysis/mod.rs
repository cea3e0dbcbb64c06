//! Spectral analysis modules
//!
//! Band table, STFT fingerprinting and profile comparison. The trait
//! abstraction allows swapping backends without changing pipeline code.

pub mod bands;
pub mod compare;
pub mod profile;
pub mod stft;
pub mod traits;

pub use bands::{band_names, FrequencyBand, FREQUENCY_BANDS, NUM_BANDS, SILENCE_FLOOR_DB};
pub use compare::{gain_vector, Comparison, ProfileComparator};
pub use profile::StftProfileExtractor;
pub use traits::{BandRenderer, ProfileExtractor};
