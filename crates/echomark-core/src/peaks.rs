//! Spectral peak extraction
//!
//! Partitions the spectrogram into fixed-size time/frequency
//! neighborhoods and keeps the single dominant bin per neighborhood.
//! This bounds peak density regardless of how loud the input is, which
//! keeps the downstream pairing stage from exploding combinatorially.

use crate::config::EngineConfig;
use crate::spectrogram::Spectrogram;
use serde::{Deserialize, Serialize};

/// A peak is a locally dominant magnitude point in the spectrogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Time index (frame number)
    pub frame: u32,
    /// Frequency bin index
    pub bin: u16,
    /// Magnitude value
    pub magnitude: f32,
}

impl Peak {
    pub fn new(frame: u32, bin: u16, magnitude: f32) -> Self {
        Self {
            frame,
            bin,
            magnitude,
        }
    }
}

/// Peak extractor
pub struct PeakExtractor {
    time_span: usize,
    freq_span: usize,
    magnitude_floor: f32,
}

impl PeakExtractor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            time_span: config.peak_time_span,
            freq_span: config.peak_freq_span,
            magnitude_floor: config.magnitude_floor,
        }
    }

    /// Extract peaks from a spectrogram, ordered by frame then bin.
    ///
    /// A silent or empty spectrogram yields an empty list, which the
    /// rest of the pipeline propagates as "no fingerprints, no
    /// matches".
    pub fn extract(&self, spectrogram: &Spectrogram) -> Vec<Peak> {
        let mut peaks = Vec::new();

        if spectrogram.is_empty() {
            return peaks;
        }

        let num_frames = spectrogram.num_frames;
        let num_bins = spectrogram.num_bins;

        for t_start in (0..num_frames).step_by(self.time_span) {
            let t_end = (t_start + self.time_span).min(num_frames);

            for f_start in (0..num_bins).step_by(self.freq_span) {
                let f_end = (f_start + self.freq_span).min(num_bins);

                if let Some(peak) =
                    self.neighborhood_max(spectrogram, t_start..t_end, f_start..f_end)
                {
                    peaks.push(peak);
                }
            }
        }

        peaks.sort_by_key(|p| (p.frame, p.bin));
        peaks
    }

    /// Maximum-magnitude bin within one neighborhood, if it clears the
    /// floor.
    fn neighborhood_max(
        &self,
        spectrogram: &Spectrogram,
        frames: std::ops::Range<usize>,
        bins: std::ops::Range<usize>,
    ) -> Option<Peak> {
        let mut best: Option<Peak> = None;

        for t in frames {
            for f in bins.clone() {
                let magnitude = spectrogram.magnitudes[t][f];
                if magnitude <= self.magnitude_floor {
                    continue;
                }
                match best {
                    Some(b) if b.magnitude >= magnitude => {}
                    _ => best = Some(Peak::new(t as u32, f as u16, magnitude)),
                }
            }
        }

        best
    }
}
