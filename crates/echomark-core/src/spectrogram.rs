//! Short-time spectral transform
//!
//! Slides a Hann-windowed FFT across the mono sample buffer and keeps
//! the magnitude of the non-negative-frequency bins per frame.

use crate::config::EngineConfig;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Spectrogram representation
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Magnitude values [time_frame][frequency_bin]
    pub magnitudes: Vec<Vec<f32>>,
    /// Number of time frames
    pub num_frames: usize,
    /// Number of frequency bins (DC through Nyquist)
    pub num_bins: usize,
}

impl Spectrogram {
    /// An empty spectrogram, produced for sub-window-length input.
    pub fn empty(num_bins: usize) -> Self {
        Self {
            magnitudes: Vec::new(),
            num_frames: 0,
            num_bins,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }
}

/// Compute the magnitude spectrogram of a mono sample buffer.
///
/// Frame count is `(len - window) / hop + 1`, clamped to zero: a clip
/// shorter than one window yields an empty spectrogram rather than an
/// error. Frames are independent and transformed in parallel; the
/// output is identical to a sequential pass.
pub fn build_spectrogram(samples: &[f32], config: &EngineConfig) -> Spectrogram {
    let window_size = config.window_size;
    let hop_size = config.hop_size;
    let num_bins = window_size / 2 + 1;

    if samples.len() < window_size {
        return Spectrogram::empty(num_bins);
    }

    let num_frames = (samples.len() - window_size) / hop_size + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(window_size);

    let window = hann_window(window_size);

    let magnitudes: Vec<Vec<f32>> = (0..num_frames)
        .into_par_iter()
        .map(|frame_idx| {
            let start = frame_idx * hop_size;

            let mut frame: Vec<Complex<f32>> = samples[start..start + window_size]
                .iter()
                .zip(window.iter())
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect();

            fft.process(&mut frame);

            // Keep DC through Nyquist; the upper half mirrors it for
            // real input.
            frame[..num_bins].iter().map(|c| c.norm()).collect()
        })
        .collect();

    Spectrogram {
        magnitudes,
        num_frames,
        num_bins,
    }
}

/// Create Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let x = i as f32 / (size - 1) as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}
