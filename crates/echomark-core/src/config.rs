//! Configuration parameters for the fingerprinting engine
//!
//! Every tunable the pipeline depends on lives here; nothing is a
//! hidden constant. `validate()` runs before any computation starts.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Invalid tunables, rejected eagerly before any DSP runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window_size must be > 0")]
    ZeroWindow,
    #[error("hop_size must be > 0")]
    ZeroHop,
    #[error("hop_size ({hop}) must not exceed window_size ({window})")]
    HopExceedsWindow { hop: usize, window: usize },
    #[error("sample_rate must be > 0")]
    ZeroSampleRate,
    #[error("peak neighborhood spans must be > 0")]
    ZeroNeighborhood,
    #[error("fan_out must be > 0")]
    ZeroFanOut,
    #[error("max_delta_ms must be > 0")]
    ZeroTargetZone,
    #[error("bucket_width_ms must be > 0")]
    ZeroBucketWidth,
}

/// Engine configuration with documented defaults.
///
/// The target-zone bounds and the histogram bucket width drive the
/// false-positive/false-negative trade-off:
///
/// * widening `max_delta_ms` / `max_freq_delta` or raising `fan_out`
///   produces more hashes per anchor, which improves recall on short
///   or noisy excerpts but raises the collision rate the scorer must
///   reject;
/// * a wider `bucket_width_ms` tolerates more jitter in the playback
///   alignment (fewer false negatives) at the cost of letting more
///   accidental collisions pile into one bucket (more false
///   positives).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate the pipeline operates at; decoded audio is
    /// resampled to this before fingerprinting.
    pub sample_rate: u32,

    // Spectrogram
    /// Analysis window length in samples.
    pub window_size: usize,
    /// Window advance per frame, in samples. Must be <= window_size.
    pub hop_size: usize,

    // Peak extraction
    /// Neighborhood span along the time axis, in frames.
    pub peak_time_span: usize,
    /// Neighborhood span along the frequency axis, in bins.
    pub peak_freq_span: usize,
    /// Minimum magnitude a neighborhood maximum must clear. Suppresses
    /// near-silence so quiet passages do not emit junk peaks.
    pub magnitude_floor: f32,

    // Fingerprint target zone
    /// Upper bound on the anchor-to-target time delta, in ms.
    pub max_delta_ms: u32,
    /// Upper bound on the absolute anchor-to-target bin distance.
    pub max_freq_delta: u16,
    /// Maximum targets paired with one anchor. Caps hash volume so a
    /// dense passage cannot poison the store with low-information
    /// hashes.
    pub fan_out: usize,

    // Scoring
    /// Width of one offset-histogram bucket, in ms.
    pub bucket_width_ms: u32,
    /// Classification threshold front ends apply to the top score
    /// (`>=` means duplicate). Not consulted by the scorer itself.
    pub score_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 11025,

            // Spectrogram: ~93ms windows, 50% overlap
            window_size: 1024,
            hop_size: 512,

            // Peak extraction
            peak_time_span: 9,
            peak_freq_span: 32,
            magnitude_floor: 0.1,

            // Target zone
            max_delta_ms: 2000,
            max_freq_delta: 128,
            fan_out: 5,

            // Scoring
            bucket_width_ms: 100,
            score_threshold: 35.0,
        }
    }
}

impl EngineConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.hop_size == 0 {
            return Err(ConfigError::ZeroHop);
        }
        if self.hop_size > self.window_size {
            return Err(ConfigError::HopExceedsWindow {
                hop: self.hop_size,
                window: self.window_size,
            });
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.peak_time_span == 0 || self.peak_freq_span == 0 {
            return Err(ConfigError::ZeroNeighborhood);
        }
        if self.fan_out == 0 {
            return Err(ConfigError::ZeroFanOut);
        }
        if self.max_delta_ms == 0 {
            return Err(ConfigError::ZeroTargetZone);
        }
        if self.bucket_width_ms == 0 {
            return Err(ConfigError::ZeroBucketWidth);
        }
        Ok(())
    }

    /// Milliseconds elapsed at the start of the given frame.
    pub fn frame_to_ms(&self, frame: u32) -> u32 {
        (frame as u64 * self.hop_size as u64 * 1000 / self.sample_rate as u64) as u32
    }
}

/// PostgreSQL connection settings for the fingerprint store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "echomark".to_string(),
            user: "echomark_user".to_string(),
            password: "echomark_pass".to_string(),
            max_connections: 10,
        }
    }
}

/// Top-level TOML configuration file: `[engine]` and `[postgres]`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub postgres: PostgresConfig,
}

impl AppConfig {
    /// Load from a TOML file, falling back to defaults for missing
    /// sections and keys.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&text)?;
        config.engine.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_hop_rejected() {
        let config = EngineConfig {
            hop_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroHop)));
    }

    #[test]
    fn hop_larger_than_window_rejected() {
        let config = EngineConfig {
            window_size: 256,
            hop_size: 512,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HopExceedsWindow { hop: 512, window: 256 })
        ));
    }

    #[test]
    fn zero_bucket_width_rejected() {
        let config = EngineConfig {
            bucket_width_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBucketWidth)));
    }

    #[test]
    fn frame_to_ms_uses_hop() {
        let config = EngineConfig {
            sample_rate: 1000,
            window_size: 100,
            hop_size: 50,
            ..Default::default()
        };
        // one hop = 50 samples at 1kHz = 50ms
        assert_eq!(config.frame_to_ms(0), 0);
        assert_eq!(config.frame_to_ms(4), 200);
    }

    #[test]
    fn toml_round_trip() {
        let config = AppConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.engine.window_size, config.engine.window_size);
        assert_eq!(back.postgres.port, config.postgres.port);
    }
}
