//! Sample-rate conversion via linear interpolation
//!
//! Fingerprinting only cares about where the dominant spectral peaks
//! sit, so interpolation artifacts well below the peak magnitudes are
//! acceptable here.

use anyhow::Result;

/// Resample audio to the target sample rate.
pub fn resample_to_target(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        anyhow::bail!("sample rates must be non-zero ({} -> {})", from_rate, to_rate);
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        if src_idx + 1 < samples.len() {
            let val = samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac;
            output.push(val);
        } else if src_idx < samples.len() {
            output.push(samples[src_idx]);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn same_rate_is_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_to_target(&samples, 8000, 8000).unwrap(), samples);
    }

    #[test]
    fn downsampling_halves_length() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
        let out = resample_to_target(&samples, 44100, 22050).unwrap();
        assert!((out.len() as i64 - 500).abs() <= 1);
    }

    #[test]
    fn interpolation_preserves_a_linear_ramp() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let out = resample_to_target(&samples, 1000, 2000).unwrap();
        // halfway between sample 0 and 1
        assert_relative_eq!(out[1], 0.5, epsilon = 1e-5);
        assert_relative_eq!(out[2], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_rate_rejected() {
        assert!(resample_to_target(&[0.0], 0, 8000).is_err());
    }
}
