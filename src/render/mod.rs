//! Equalization rendering

pub mod filter;
pub mod renderer;

pub use crate::analysis::BandRenderer;
pub use renderer::SequentialBandRenderer;
