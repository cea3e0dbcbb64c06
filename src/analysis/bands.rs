//! The fixed ten-band frequency table
//!
//! Bands are ascending, contiguous and span 20 Hz to 20 kHz. Every
//! [`SpectralProfile`](crate::types::SpectralProfile) and
//! [`GainVector`](crate::types::GainVector) is index-aligned with this table.

/// Number of frequency bands
pub const NUM_BANDS: usize = 10;

/// Level assigned to every band of a silent clip, and to a band with no
/// spectral bins
pub const SILENCE_FLOOR_DB: f32 = -80.0;

/// A half-open frequency interval `[lower_hz, upper_hz)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    /// Lower edge in Hz (inclusive)
    pub lower_hz: f32,
    /// Upper edge in Hz (exclusive)
    pub upper_hz: f32,
    /// Catalog column name for this band
    pub name: &'static str,
}

impl FrequencyBand {
    const fn new(lower_hz: f32, upper_hz: f32, name: &'static str) -> Self {
        Self {
            lower_hz,
            upper_hz,
            name,
        }
    }

    /// Whether a frequency falls inside this band
    pub fn contains(&self, hz: f32) -> bool {
        hz >= self.lower_hz && hz < self.upper_hz
    }
}

/// Band table: sub-bass through air
pub const FREQUENCY_BANDS: [FrequencyBand; NUM_BANDS] = [
    FrequencyBand::new(20.0, 60.0, "sub_bass"),
    FrequencyBand::new(60.0, 120.0, "bass"),
    FrequencyBand::new(120.0, 250.0, "lower_midrange"),
    FrequencyBand::new(250.0, 500.0, "midrange"),
    FrequencyBand::new(500.0, 1000.0, "upper_midrange"),
    FrequencyBand::new(1000.0, 2000.0, "low_treble"),
    FrequencyBand::new(2000.0, 4000.0, "treble"),
    FrequencyBand::new(4000.0, 8000.0, "presence"),
    FrequencyBand::new(8000.0, 16000.0, "brilliance"),
    FrequencyBand::new(16000.0, 20000.0, "air"),
];

/// Band catalog names in table order
pub fn band_names() -> [&'static str; NUM_BANDS] {
    FREQUENCY_BANDS.map(|b| b.name)
}
