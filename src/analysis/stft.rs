//! Short-time magnitude spectrum for fingerprinting
//!
//! # STFT Parameter Choices
//!
//! - **NFFT = 4096**: At 44.1kHz, this gives ~93ms windows with 2049 frequency
//!   bins (~10.8 Hz resolution), enough to put several bins inside the
//!   narrowest (20-60 Hz) band.
//!
//! - **HOP_LENGTH = 1024**: 75% overlap between consecutive frames.
//!
//! - **Hann window** (periodic): tapering limits leakage across band edges.
//!
//! - **Centered frames**: the signal is reflect-padded by NFFT/2 on both sides
//!   so the first frame is centered on sample 0.
//!
//! Fingerprinting only needs the loudest value each bin reaches over the whole
//! clip, so frames are folded into a per-bin running maximum instead of being
//! stored as a full spectrogram.

use crate::config::ComputeBackend;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;
use tracing::trace;

/// FFT window size (4096 samples = ~93ms at 44.1kHz)
pub const NFFT: usize = 4096;

/// Hop length between frames - 75% overlap
pub const HOP_LENGTH: usize = 1024;

/// Number of frequency bins in positive-frequency half of spectrum
pub const NUM_FREQ_BINS: usize = NFFT / 2 + 1; // 2049

/// Per-bin maximum magnitude over every frame of a signal
#[derive(Debug, Clone)]
pub struct PeakSpectrum {
    /// Maximum magnitude reached by each bin, `NUM_FREQ_BINS` entries
    pub peaks: Vec<f32>,
    /// Number of STFT frames folded into `peaks`
    pub num_frames: usize,
    /// Sample rate the spectrum was computed at
    pub sample_rate: u32,
}

impl PeakSpectrum {
    /// Center frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f32 {
        bin_frequency(k, self.sample_rate)
    }

    /// Loudest magnitude anywhere in the spectrum
    pub fn global_max(&self) -> f32 {
        self.peaks.iter().copied().fold(0.0, f32::max)
    }
}

/// Center frequency of bin `k` for an NFFT-point transform
pub fn bin_frequency(k: usize, sample_rate: u32) -> f32 {
    k as f32 * sample_rate as f32 / NFFT as f32
}

/// Compute the per-bin peak magnitude spectrum of a mono signal
///
/// The parallel backend splits frames across the rayon pool. Maximum is
/// associative and commutative, so both backends return identical values.
pub fn peak_spectrum(samples: &[f32], sample_rate: u32, backend: ComputeBackend) -> PeakSpectrum {
    let padded = pad_centered(samples);
    let num_frames = (padded.len().saturating_sub(NFFT)) / HOP_LENGTH + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(NFFT);
    let window = hann_window(NFFT);

    trace!(
        "STFT over {} samples: {} frames ({:?} backend)",
        samples.len(),
        num_frames,
        backend
    );

    let peaks = match backend {
        ComputeBackend::Parallel => (0..num_frames)
            .into_par_iter()
            .fold(
                || vec![0.0f32; NUM_FREQ_BINS],
                |mut peaks, frame_idx| {
                    fold_frame(&padded, frame_idx, &fft, &window, &mut peaks);
                    peaks
                },
            )
            .reduce(|| vec![0.0f32; NUM_FREQ_BINS], merge_peaks),
        ComputeBackend::Cpu | ComputeBackend::Auto => {
            let mut peaks = vec![0.0f32; NUM_FREQ_BINS];
            for frame_idx in 0..num_frames {
                fold_frame(&padded, frame_idx, &fft, &window, &mut peaks);
            }
            peaks
        }
    };

    PeakSpectrum {
        peaks,
        num_frames,
        sample_rate,
    }
}

/// Transform one frame and raise `peaks` to its magnitudes
fn fold_frame(
    padded: &[f32],
    frame_idx: usize,
    fft: &Arc<dyn Fft<f32>>,
    window: &[f32],
    peaks: &mut [f32],
) {
    let start = frame_idx * HOP_LENGTH;
    let end = (start + NFFT).min(padded.len());

    let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); NFFT];
    for (i, &w) in window.iter().enumerate() {
        if start + i < end {
            buffer[i] = Complex::new(padded[start + i] * w, 0.0);
        }
    }

    fft.process(&mut buffer);

    for (peak, bin) in peaks.iter_mut().zip(&buffer[..NUM_FREQ_BINS]) {
        *peak = peak.max(bin.norm());
    }
}

fn merge_peaks(mut a: Vec<f32>, b: Vec<f32>) -> Vec<f32> {
    for (x, y) in a.iter_mut().zip(b) {
        *x = x.max(y);
    }
    a
}

/// Pad by NFFT/2 on both sides so frames are centered
///
/// Reflect padding mirrors the signal without repeating the edge sample. It
/// needs more than NFFT/2 samples; shorter signals are zero-padded instead.
fn pad_centered(samples: &[f32]) -> Vec<f32> {
    let pad = NFFT / 2;
    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);

    if samples.len() > pad {
        padded.extend(samples[1..=pad].iter().rev());
        padded.extend_from_slice(samples);
        let n = samples.len();
        padded.extend(samples[n - 1 - pad..n - 1].iter().rev());
    } else {
        padded.resize(pad, 0.0);
        padded.extend_from_slice(samples);
        padded.resize(samples.len() + 2 * pad, 0.0);
    }

    padded
}

/// Generate a periodic Hann window of given size
fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, amplitude: f32, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_stft_constants() {
        assert_eq!(NFFT, 4096);
        assert_eq!(HOP_LENGTH, 1024);
        assert_eq!(NUM_FREQ_BINS, 2049);
    }

    #[test]
    fn test_hann_window() {
        let window = hann_window(4);
        assert_eq!(window.len(), 4);
        // Hann window should be 0 at the start, max at center
        assert!(window[0] < 0.01);
        assert!(window[2] > 0.9);
    }

    #[test]
    fn test_reflect_padding() {
        let samples: Vec<f32> = (0..5000).map(|i| i as f32).collect();
        let padded = pad_centered(&samples);
        assert_eq!(padded.len(), 5000 + NFFT);
        // Left edge mirrors samples[1..=2048] without repeating sample 0
        assert_eq!(padded[NFFT / 2 - 1], 1.0);
        assert_eq!(padded[0], 2048.0);
        assert_eq!(padded[NFFT / 2], 0.0);
        // Right edge mirrors without repeating the last sample
        assert_eq!(padded[NFFT / 2 + 5000], 4998.0);
    }

    #[test]
    fn test_short_signal_zero_padding() {
        let padded = pad_centered(&[1.0, 2.0, 3.0]);
        assert_eq!(padded.len(), 3 + NFFT);
        assert_eq!(padded[NFFT / 2], 1.0);
        assert_eq!(padded[0], 0.0);
        assert_eq!(*padded.last().unwrap(), 0.0);
    }

    #[test]
    fn test_frame_count_matches_centered_stft() {
        let spectrum = peak_spectrum(&vec![0.0; 10240], 44100, ComputeBackend::Cpu);
        assert_eq!(spectrum.num_frames, 1 + 10240 / HOP_LENGTH);
        assert_eq!(spectrum.peaks.len(), NUM_FREQ_BINS);
    }

    #[test]
    fn test_sine_peak_lands_in_expected_bin() {
        let samples = sine(1000.0, 0.5, 44100, 44100);
        let spectrum = peak_spectrum(&samples, 44100, ComputeBackend::Cpu);
        let (peak_bin, _) = spectrum
            .peaks
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |acc, (k, &m)| if m > acc.1 { (k, m) } else { acc });
        let peak_hz = spectrum.bin_frequency(peak_bin);
        assert!((peak_hz - 1000.0).abs() < 11.0, "peak at {} Hz", peak_hz);
    }

    #[test]
    fn test_backends_agree() {
        let mut samples = sine(220.0, 0.3, 30000, 44100);
        for (s, t) in samples.iter_mut().zip(sine(5000.0, 0.2, 30000, 44100)) {
            *s += t;
        }
        let cpu = peak_spectrum(&samples, 44100, ComputeBackend::Cpu);
        let par = peak_spectrum(&samples, 44100, ComputeBackend::Parallel);
        assert_eq!(cpu.peaks, par.peaks);
        assert_eq!(cpu.num_frames, par.num_frames);
    }

    #[test]
    fn test_silence_has_zero_peaks() {
        let spectrum = peak_spectrum(&vec![0.0; 8192], 44100, ComputeBackend::Cpu);
        assert_eq!(spectrum.global_max(), 0.0);
    }
}
