//! First-order RC filters with fixed-width sample semantics
//!
//! Both filters seed their state with the first input sample and saturate
//! every output sample at full scale, the way integer PCM filtering does.

use crate::analysis::FrequencyBand;
use std::f64::consts::PI;

/// Clamp a sample to the representable range [-1.0, 1.0]
#[inline]
pub fn saturate(sample: f32) -> f32 {
    sample.clamp(-1.0, 1.0)
}

/// RC time constant and sample period for a cutoff
fn rc_dt(cutoff_hz: f32, sample_rate: u32) -> (f64, f64) {
    let rc = 1.0 / (cutoff_hz as f64 * 2.0 * PI);
    let dt = 1.0 / sample_rate as f64;
    (rc, dt)
}

/// One-pole low-pass filter
pub fn low_pass(samples: &[f32], cutoff_hz: f32, sample_rate: u32) -> Vec<f32> {
    let Some(&first) = samples.first() else {
        return Vec::new();
    };

    let (rc, dt) = rc_dt(cutoff_hz, sample_rate);
    let alpha = dt / (rc + dt);

    let mut out = Vec::with_capacity(samples.len());
    let mut last = first as f64;
    out.push(saturate(first));
    for &x in &samples[1..] {
        last += alpha * (x as f64 - last);
        out.push(saturate(last as f32));
    }
    out
}

/// One-pole high-pass filter
pub fn high_pass(samples: &[f32], cutoff_hz: f32, sample_rate: u32) -> Vec<f32> {
    let Some(&first) = samples.first() else {
        return Vec::new();
    };

    let (rc, dt) = rc_dt(cutoff_hz, sample_rate);
    let alpha = rc / (rc + dt);

    let mut out = Vec::with_capacity(samples.len());
    let mut last = first as f64;
    out.push(saturate(first));
    for pair in samples.windows(2) {
        last = alpha * (last + pair[1] as f64 - pair[0] as f64);
        out.push(saturate(last as f32));
    }
    out
}

/// Isolate a band: low-pass at the upper edge, then high-pass at the lower edge
pub fn band_pass(samples: &[f32], band: &FrequencyBand, sample_rate: u32) -> Vec<f32> {
    let below_upper = low_pass(samples, band.upper_hz, sample_rate);
    high_pass(&below_upper, band.lower_hz, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FREQUENCY_BANDS;

    fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / 44100.0).sin())
            .collect()
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_empty_input() {
        assert!(low_pass(&[], 100.0, 44100).is_empty());
        assert!(high_pass(&[], 100.0, 44100).is_empty());
    }

    #[test]
    fn test_first_sample_is_passed_through() {
        let input = [0.25, 0.0, 0.0];
        assert_eq!(low_pass(&input, 100.0, 44100)[0], 0.25);
        assert_eq!(high_pass(&input, 100.0, 44100)[0], 0.25);
    }

    #[test]
    fn test_low_pass_keeps_dc_and_cuts_highs() {
        let dc = vec![0.5; 4410];
        let out = low_pass(&dc, 100.0, 44100);
        assert!((out[4409] - 0.5).abs() < 1e-6);

        let high = sine(10000.0, 0.5, 44100);
        let out = low_pass(&high, 100.0, 44100);
        assert!(peak(&out[22050..]) < 0.01);
    }

    #[test]
    fn test_high_pass_blocks_dc_and_keeps_highs() {
        let dc = vec![0.5; 44100];
        let out = high_pass(&dc, 100.0, 44100);
        assert!(out[44099].abs() < 1e-3);

        let high = sine(10000.0, 0.5, 44100);
        let out = high_pass(&high, 100.0, 44100);
        assert!(peak(&out[22050..]) > 0.45);
    }

    #[test]
    fn test_band_pass_isolates_band() {
        // 1 kHz sits in low_treble (1000-2000), far from sub_bass
        let tone = sine(1414.0, 0.5, 44100);
        let in_band = band_pass(&tone, &FREQUENCY_BANDS[5], 44100);
        let out_band = band_pass(&tone, &FREQUENCY_BANDS[0], 44100);
        assert!(peak(&in_band[22050..]) > 5.0 * peak(&out_band[22050..]));
    }

    #[test]
    fn test_output_saturates_at_full_scale() {
        let mut square = Vec::new();
        for _ in 0..50 {
            square.extend(std::iter::repeat(-1.0).take(20));
            square.extend(std::iter::repeat(1.0).take(20));
        }
        let out = high_pass(&square, 20.0, 44100);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
}
