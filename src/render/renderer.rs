//! Sequential band renderer
//!
//! Starts from the original clip and, for each band in ascending order,
//! band-passes the *current* accumulator, scales the copy by the band's gain
//! and overlays it back onto the accumulator. Each step sees the output of
//! every previous step, so band order is part of the result: processing the
//! same gains in another order gives a different clip. Even all-zero gains
//! change the clip, since each step adds a unity-gain copy of its band.

use super::filter::{band_pass, saturate};
use crate::analysis::{BandRenderer, FREQUENCY_BANDS, NUM_BANDS};
use crate::error::{GenreqError, Result};
use crate::types::{AudioClip, GainVector};
use tracing::{debug, trace};

/// Ascending band order
const ASCENDING: [usize; NUM_BANDS] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// Cascaded band-pass-and-overlay renderer
#[derive(Debug, Clone, Default)]
pub struct SequentialBandRenderer;

impl SequentialBandRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render with bands visited in `order`
    fn render_in_order(
        &self,
        clip: &AudioClip,
        gains: &GainVector,
        order: &[usize],
    ) -> Result<AudioClip> {
        clip.validate()?;
        if let Some(i) = gains.gains().iter().position(|g| !g.is_finite()) {
            return Err(GenreqError::render_error(format!(
                "gain for band '{}' is not finite",
                FREQUENCY_BANDS[i].name
            )));
        }

        let mut current = clip.clone();

        for &band_idx in order {
            let band = &FREQUENCY_BANDS[band_idx];
            let factor = gains.linear(band_idx);

            for channel in current.channels.iter_mut() {
                let band_copy = band_pass(channel, band, clip.sample_rate);
                overlay(channel, &band_copy, factor);
            }

            trace!(
                "Band {} ({}-{} Hz) overlaid at {:+.2} dB",
                band.name,
                band.lower_hz,
                band.upper_hz,
                gains[band_idx]
            );
        }

        Ok(current)
    }
}

impl BandRenderer for SequentialBandRenderer {
    fn render(&self, clip: &AudioClip, gains: &GainVector) -> Result<AudioClip> {
        debug!(
            "Rendering {} channel(s), {} frames @ {}Hz",
            clip.num_channels(),
            clip.num_frames(),
            clip.sample_rate
        );
        self.render_in_order(clip, gains, &ASCENDING)
    }

    fn name(&self) -> &'static str {
        "sequential-overlay"
    }
}

/// Add `layer * factor` onto `base`, saturating at full scale
fn overlay(base: &mut [f32], layer: &[f32], factor: f32) {
    for (b, &l) in base.iter_mut().zip(layer) {
        *b = saturate(*b + saturate(l * factor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::f32::consts::PI;

    fn mix(freqs: &[f32], amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / 44100.0;
                // cos so the first sample is non-zero
                freqs.iter().map(|f| amplitude * (2.0 * PI * f * t).cos()).sum()
            })
            .collect()
    }

    fn max_abs_diff(a: &AudioClip, b: &AudioClip) -> f32 {
        a.channels
            .iter()
            .zip(&b.channels)
            .flat_map(|(x, y)| x.iter().zip(y).map(|(p, q)| (p - q).abs()))
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_shape_is_preserved() {
        let mut clip = AudioClip::new(vec![mix(&[100.0], 0.1, 4410), mix(&[900.0], 0.1, 4410)], 44100);
        clip.bits_per_sample = Some(24);
        let out = SequentialBandRenderer::new()
            .render(&clip, &GainVector::zeros())
            .unwrap();
        assert_eq!(out.num_channels(), 2);
        assert_eq!(out.num_frames(), 4410);
        assert_eq!(out.sample_rate, 44100);
        assert_eq!(out.bits_per_sample, Some(24));
    }

    #[test]
    fn test_zero_gains_still_change_the_clip() {
        let clip = AudioClip::mono(mix(&[80.0, 700.0, 5000.0], 0.05, 22050), 44100);
        let out = SequentialBandRenderer::new()
            .render(&clip, &GainVector::zeros())
            .unwrap();
        assert!(max_abs_diff(&clip, &out) > 1e-3);
    }

    #[test]
    fn test_band_order_matters() {
        let clip = AudioClip::mono(mix(&[50.0, 400.0, 3000.0], 0.3, 22050), 44100);
        let gains = GainVector::new([12.0, -6.0, 9.0, 3.0, -12.0, 6.0, 0.0, 10.0, -3.0, 4.0]);
        let renderer = SequentialBandRenderer::new();

        let ascending = renderer.render_in_order(&clip, &gains, &ASCENDING).unwrap();
        let mut reversed_order = ASCENDING;
        reversed_order.reverse();
        let reversed = renderer.render_in_order(&clip, &gains, &reversed_order).unwrap();

        assert!(max_abs_diff(&ascending, &reversed) > 1e-3);
    }

    #[test]
    fn test_render_is_deterministic() {
        let clip = AudioClip::mono(mix(&[200.0, 2500.0], 0.2, 8820), 44100);
        let gains = GainVector::new([1.0, 2.0, 3.0, -1.0, -2.0, -3.0, 0.5, -0.5, 0.0, 6.0]);
        let renderer = SequentialBandRenderer::new();
        let a = renderer.render(&clip, &gains).unwrap();
        let b = renderer.render(&clip, &gains).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_deep_cuts_leave_clip_nearly_untouched() {
        let clip = AudioClip::mono(mix(&[300.0, 4000.0], 0.2, 8820), 44100);
        let gains = GainVector::new([-120.0; NUM_BANDS]);
        let out = SequentialBandRenderer::new().render(&clip, &gains).unwrap();
        assert!(max_abs_diff(&clip, &out) < 1e-4);
    }

    #[test]
    fn test_output_stays_within_full_scale() {
        let clip = AudioClip::mono(mix(&[60.0, 500.0, 6000.0], 0.3, 8820), 44100);
        let gains = GainVector::new([24.0; NUM_BANDS]);
        let out = SequentialBandRenderer::new().render(&clip, &gains).unwrap();
        assert!(out.channels[0].iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_non_finite_gain_is_render_failure() {
        let clip = AudioClip::mono(vec![0.1; 100], 44100);
        let mut gains = [0.0; NUM_BANDS];
        gains[2] = f32::INFINITY;
        let err = SequentialBandRenderer::new()
            .render(&clip, &GainVector::new(gains))
            .unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Render);
        assert!(err.to_string().contains("lower_midrange"));
    }

    #[test]
    fn test_channelless_clip_is_render_failure() {
        let clip = AudioClip::new(Vec::new(), 44100);
        let err = SequentialBandRenderer::new()
            .render(&clip, &GainVector::zeros())
            .unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Render);
    }
}
