//! Fingerprint generation and hashing
//!
//! Pairs each peak (the anchor) with a bounded number of peaks inside
//! a forward-looking target zone and packs each pair into a 32-bit
//! hash. The hash depends only on the two frequency bins and the time
//! delta between them, never on absolute position, so the same
//! acoustic pattern hashes identically wherever it occurs in a
//! recording.

use crate::config::EngineConfig;
use crate::peaks::Peak;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Song id reserved for transient query material; never persisted.
pub const QUERY_SONG_ID: u32 = 0;

/// A stored or queried fingerprint: content hash plus the anchor's
/// absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// 32-bit combinatorial hash of the peak pair
    pub hash: u32,
    /// Owning song, or [`QUERY_SONG_ID`] for query material
    pub song_id: u32,
    /// Absolute time of the anchor peak, in ms
    pub anchor_time_ms: u32,
}

/// Pack an anchor/target pair into a 32-bit hash.
///
/// Layout: 9 bits anchor bin | 9 bits target bin | 14 bits delta ms.
/// Bins above 511 and deltas above ~16s alias; collisions are expected
/// and resolved by the time-coherence scorer, not the hash.
pub fn pack_hash(anchor_bin: u16, target_bin: u16, delta_ms: u32) -> u32 {
    ((anchor_bin as u32 & 0x1FF) << 23) | ((target_bin as u32 & 0x1FF) << 14) | (delta_ms & 0x3FFF)
}

/// Fingerprint generator
pub struct FingerprintGenerator {
    config: EngineConfig,
}

impl FingerprintGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate fingerprints from peaks ordered by frame.
    ///
    /// Duplicate hashes overwrite (last write wins); repeats of the
    /// same phrase inside one song are expected and harmless. The
    /// result is deterministic for a given peak list.
    pub fn generate(&self, peaks: &[Peak], song_id: u32) -> HashMap<u32, FingerprintRecord> {
        let mut fingerprints = HashMap::new();

        for (i, anchor) in peaks.iter().enumerate() {
            let anchor_ms = self.config.frame_to_ms(anchor.frame);
            let mut paired = 0usize;

            for target in &peaks[i + 1..] {
                if paired >= self.config.fan_out {
                    break;
                }

                let target_ms = self.config.frame_to_ms(target.frame);
                let delta_ms = target_ms.saturating_sub(anchor_ms);

                // Peaks are frame-ordered, so once the zone closes in
                // time no later peak can reopen it.
                if delta_ms > self.config.max_delta_ms {
                    break;
                }
                if delta_ms == 0 {
                    continue;
                }
                if anchor.bin.abs_diff(target.bin) > self.config.max_freq_delta {
                    continue;
                }

                let hash = pack_hash(anchor.bin, target.bin, delta_ms);
                fingerprints.insert(
                    hash,
                    FingerprintRecord {
                        hash,
                        song_id,
                        anchor_time_ms: anchor_ms,
                    },
                );
                paired += 1;
            }
        }

        fingerprints
    }
}
