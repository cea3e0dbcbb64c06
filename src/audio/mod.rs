//! Audio decode and encode

pub mod decoder;
pub mod encoder;

pub use decoder::{decode_clip, resample, ANALYSIS_SAMPLE_RATE};
pub use encoder::{write_wav, WavFormat};
