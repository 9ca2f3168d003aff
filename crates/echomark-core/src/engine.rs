//! Registration and query pipelines
//!
//! Both operations run the same CPU-bound chain (spectrogram, peaks,
//! fingerprints) and differ only at the store boundary: registration
//! appends every record, a query resolves the hash set in one batch
//! and hands the couples to the scorer. The store is the only
//! suspension point, so wrapping either call in a timeout aborts
//! cleanly between stages.

use std::collections::HashMap;
use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::fingerprint::{FingerprintGenerator, FingerprintRecord, QUERY_SONG_ID};
use crate::matching::{rank, MatchResult, MatchScorer};
use crate::peaks::PeakExtractor;
use crate::spectrogram::build_spectrogram;
use crate::store::{FingerprintStore, StoreError};

/// Pipeline failure, distinguishable by the caller: bad tunables vs an
/// unreachable index. "No match found" is an empty result, not an
/// error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("song id 0 is reserved for query material")]
    ReservedSongId,
}

/// Aggregate outcome of one registration.
///
/// Per-record failures do not abort the remaining inserts; records are
/// independent and idempotent, so re-running the registration is
/// always safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Fingerprint records the pipeline produced
    pub total: usize,
    /// Records accepted by the store
    pub inserted: usize,
    /// Records the store rejected
    pub failed: usize,
}

/// Run the registration pipeline and insert every fingerprint.
///
/// `sample_rate` describes `samples` as delivered by the decoder
/// collaborator; anchor times are derived from it. A clip too short or
/// too quiet to fingerprint registers zero records, which is a valid
/// outcome, not an error.
pub async fn register_song(
    store: &dyn FingerprintStore,
    samples: &[f32],
    sample_rate: u32,
    song_id: u32,
    config: &EngineConfig,
) -> Result<RegistrationReport, EngineError> {
    if song_id == QUERY_SONG_ID {
        return Err(EngineError::ReservedSongId);
    }
    let fingerprints = fingerprint_samples(samples, sample_rate, song_id, config)?;

    // Sorted iteration keeps insert order reproducible.
    let mut hashes: Vec<u32> = fingerprints.keys().copied().collect();
    hashes.sort_unstable();

    let mut inserted = 0usize;
    let mut failed = 0usize;
    for hash in &hashes {
        let record = &fingerprints[hash];
        match store
            .insert(record.hash, record.song_id, record.anchor_time_ms)
            .await
        {
            Ok(()) => inserted += 1,
            Err(err) => {
                log::warn!("insert failed for hash {:#010x}: {}", hash, err);
                failed += 1;
            }
        }
    }

    log::info!(
        "registered song {}: {} records, {} failed",
        song_id,
        hashes.len(),
        failed
    );

    Ok(RegistrationReport {
        total: hashes.len(),
        inserted,
        failed,
    })
}

/// Run the query pipeline and return ranked candidates.
///
/// The full hash set is resolved in a single `batch_get` before any
/// scoring happens; a store failure here is fatal because no
/// confidence decision can be made without the index.
pub async fn find_matches(
    store: &dyn FingerprintStore,
    samples: &[f32],
    sample_rate: u32,
    config: &EngineConfig,
) -> Result<Vec<MatchResult>, EngineError> {
    let fingerprints = fingerprint_samples(samples, sample_rate, QUERY_SONG_ID, config)?;
    if fingerprints.is_empty() {
        return Ok(Vec::new());
    }

    let mut hashes: Vec<u32> = fingerprints.keys().copied().collect();
    hashes.sort_unstable();

    let stored = store.batch_get(&hashes).await?;

    let scorer = MatchScorer::new(config.bucket_width_ms);
    let scores = scorer.score(&fingerprints, &stored);

    Ok(rank(scores))
}

/// The shared CPU-bound half of both pipelines.
fn fingerprint_samples(
    samples: &[f32],
    sample_rate: u32,
    song_id: u32,
    config: &EngineConfig,
) -> Result<HashMap<u32, FingerprintRecord>, EngineError> {
    config.validate()?;

    // The decoder may deliver a rate other than the configured one;
    // anchor times must follow the actual samples.
    let config = EngineConfig {
        sample_rate,
        ..config.clone()
    };
    config.validate()?;

    let spectrogram = build_spectrogram(samples, &config);
    let peaks = PeakExtractor::new(&config).extract(&spectrogram);
    Ok(FingerprintGenerator::new(&config).generate(&peaks, song_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Couple, MemoryStore};
    use async_trait::async_trait;
    use std::f32::consts::PI;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SAMPLE_RATE: u32 = 8000;

    fn test_config() -> EngineConfig {
        EngineConfig {
            sample_rate: SAMPLE_RATE,
            window_size: 256,
            hop_size: 128,
            peak_time_span: 10,
            peak_freq_span: 32,
            magnitude_floor: 0.1,
            max_delta_ms: 2000,
            max_freq_delta: 128,
            fan_out: 5,
            bucket_width_ms: 100,
            score_threshold: 5.0,
        }
    }

    /// Four half-second tones; enough spectral structure to produce a
    /// healthy peak and hash set.
    fn melody(freqs: &[f32]) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in freqs {
            for i in 0..(SAMPLE_RATE / 2) {
                samples.push((2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin());
            }
        }
        samples
    }

    fn melody_a() -> Vec<f32> {
        melody(&[500.0, 1500.0, 2500.0, 3200.0])
    }

    /// A store that rejects every third insert.
    struct FlakyStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl FingerprintStore for FlakyStore {
        async fn insert(
            &self,
            hash: u32,
            song_id: u32,
            anchor_time_ms: u32,
        ) -> Result<(), StoreError> {
            if self.writes.fetch_add(1, Ordering::SeqCst) % 3 == 0 {
                return Err(StoreError::Unavailable("simulated write failure".into()));
            }
            self.inner.insert(hash, song_id, anchor_time_ms).await
        }

        async fn batch_get(
            &self,
            hashes: &[u32],
        ) -> Result<HashMap<u32, Vec<Couple>>, StoreError> {
            self.inner.batch_get(hashes).await
        }
    }

    /// A store whose lookup side is down.
    struct DownStore {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl FingerprintStore for DownStore {
        async fn insert(&self, _: u32, _: u32, _: u32) -> Result<(), StoreError> {
            Ok(())
        }

        async fn batch_get(
            &self,
            _: &[u32],
        ) -> Result<HashMap<u32, Vec<Couple>>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn self_match_wins_with_coherent_offsets() {
        let store = MemoryStore::new();
        let config = test_config();
        let samples = melody_a();

        let report = register_song(&store, &samples, SAMPLE_RATE, 1, &config)
            .await
            .unwrap();
        assert!(report.total > 10, "expected a dense hash set");
        assert_eq!(report.failed, 0);
        assert_eq!(report.inserted, report.total);

        let matches = find_matches(&store, &samples, SAMPLE_RATE, &config)
            .await
            .unwrap();
        assert!(!matches.is_empty());
        assert_eq!(matches[0].song_id, 1);
        // Every shared hash aligns at offset zero, so the dominant
        // bucket holds essentially the whole hash set.
        assert!(matches[0].score >= report.total as f64 * 0.9);
    }

    #[tokio::test]
    async fn time_shift_preserves_winner_and_score() {
        let store = MemoryStore::new();
        let config = test_config();

        // Register the melody preceded by 4.8 s of silence: 300 hops,
        // a multiple of peak_time_span, so the registered peaks are an
        // exact time translation of the query's.
        let mut padded = vec![0.0f32; 300 * config.hop_size];
        padded.extend(melody_a());
        register_song(&store, &padded, SAMPLE_RATE, 1, &config)
            .await
            .unwrap();

        let query = melody_a();
        let matches = find_matches(&store, &query, SAMPLE_RATE, &config)
            .await
            .unwrap();
        assert_eq!(matches[0].song_id, 1);

        let self_store = MemoryStore::new();
        register_song(&self_store, &query, SAMPLE_RATE, 1, &config)
            .await
            .unwrap();
        let baseline = find_matches(&self_store, &query, SAMPLE_RATE, &config)
            .await
            .unwrap();

        // Offsets are uniformly +4800 ms instead of 0; the histogram
        // mode must not shrink by more than edge effects.
        assert!(matches[0].score >= baseline[0].score * 0.9);
    }

    #[tokio::test]
    async fn unrelated_audio_stays_below_threshold() {
        let store = MemoryStore::new();
        let config = test_config();

        register_song(&store, &melody_a(), SAMPLE_RATE, 1, &config)
            .await
            .unwrap();

        let unrelated = melody(&[700.0, 1900.0, 3000.0, 900.0]);
        let matches = find_matches(&store, &unrelated, SAMPLE_RATE, &config)
            .await
            .unwrap();

        assert!(
            matches.is_empty() || matches[0].score < config.score_threshold,
            "unrelated audio scored {:?}",
            matches.first()
        );
    }

    #[tokio::test]
    async fn silence_yields_no_matches_and_no_records() {
        let store = MemoryStore::new();
        let config = test_config();

        let silence = vec![0.0f32; 16000];
        let report = register_song(&store, &silence, SAMPLE_RATE, 1, &config)
            .await
            .unwrap();
        assert_eq!(report.total, 0);

        let matches = find_matches(&store, &silence, SAMPLE_RATE, &config)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn partial_insert_failures_leave_song_queryable() {
        let store = FlakyStore {
            inner: MemoryStore::new(),
            writes: AtomicUsize::new(0),
        };
        let config = test_config();
        let samples = melody_a();

        let report = register_song(&store, &samples, SAMPLE_RATE, 1, &config)
            .await
            .unwrap();
        assert!(report.failed > 0, "flaky store should reject some writes");
        assert!(report.inserted > 0, "remaining inserts must survive");
        assert_eq!(report.inserted + report.failed, report.total);

        let matches = find_matches(&store, &samples, SAMPLE_RATE, &config)
            .await
            .unwrap();
        assert_eq!(matches[0].song_id, 1);
    }

    #[tokio::test]
    async fn query_store_failure_is_fatal() {
        let store = DownStore {
            lookups: AtomicUsize::new(0),
        };
        let config = test_config();

        let result = find_matches(&store, &melody_a(), SAMPLE_RATE, &config).await;
        assert!(matches!(result, Err(EngineError::Store(_))));
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_config_rejected_before_any_work() {
        let store = DownStore {
            lookups: AtomicUsize::new(0),
        };
        let config = EngineConfig {
            bucket_width_ms: 0,
            ..test_config()
        };

        let result = find_matches(&store, &melody_a(), SAMPLE_RATE, &config).await;
        assert!(matches!(result, Err(EngineError::Config(_))));
        // The store must never be touched with bad tunables.
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn song_id_zero_is_rejected_for_registration() {
        let store = MemoryStore::new();
        let result =
            register_song(&store, &melody_a(), SAMPLE_RATE, QUERY_SONG_ID, &test_config()).await;
        assert!(matches!(result, Err(EngineError::ReservedSongId)));
        assert!(store.is_empty());
    }
}
