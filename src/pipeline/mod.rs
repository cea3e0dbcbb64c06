//! Equalization pipeline

pub mod equalizer;
pub mod orchestrator;

pub use equalizer::{equalize_file, Equalized, Equalizer};
pub use orchestrator::{run, PipelineResult, REPORT_FILENAME};
