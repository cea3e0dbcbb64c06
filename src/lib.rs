//! genreq - Genre-matched adaptive spectral equalization
//!
//! Measures a ten-band loudness fingerprint of an audio clip, compares it
//! with the reference fingerprint of a target genre and renders the clip
//! through ten cascaded band-pass-and-overlay steps that apply the
//! resulting per-band gain corrections.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `discovery`: Input scanning and output naming
//! - `audio`: Decoding (symphonia), resampling (rubato) and WAV export (hound)
//! - `analysis`: Band table, STFT fingerprinting and profile comparison
//! - `profiles`: Genre reference stores (built-in presets, JSON catalogs)
//! - `render`: Sequential band renderer
//! - `pipeline`: Single-clip equalization and batch orchestration
//! - `export`: JSON diagnostics report
//!
//! # Example
//!
//! ```no_run
//! use genreq::pipeline::Equalizer;
//! use genreq::profiles::BuiltinProfileStore;
//! use genreq::types::GenreKey;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let equalizer = Equalizer::new(Arc::new(BuiltinProfileStore::new()));
//! let result = equalizer.equalize_file(
//!     Path::new("clip.mp3"),
//!     Path::new("clip_hip-hop.wav"),
//!     &GenreKey::new("Hip-Hop"),
//! );
//! println!("success: {}", result.success);
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod profiles;
pub mod render;
pub mod types;

// Re-export key types at crate root
pub use error::{FailureKind, GenreqError, Result};
pub use types::{AudioClip, EqualizationResult, GainVector, GenreKey, SpectralProfile};
