//! Time-coherence scoring and ranking
//!
//! A shared hash on its own proves little; unrelated songs collide by
//! design. What distinguishes a true match is that its hash hits agree
//! on a single playback offset. The scorer buckets the signed offset
//! `stored anchor - query anchor` per song and takes the most
//! populated bucket as the score; collisions scatter across buckets
//! while real matches spike in one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::fingerprint::FingerprintRecord;
use crate::store::Couple;


/// A scored candidate song, produced fresh per query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub song_id: u32,
    /// Size of the dominant offset bucket
    pub score: f64,
    /// Earliest stored anchor time seen for this song, for display
    pub timestamp_ms: u32,
}

/// Per-song aggregates accumulated while scoring.
#[derive(Debug, Clone, Copy)]
struct SongTally {
    score: usize,
    earliest_ms: u32,
}

/// Match scorer
pub struct MatchScorer {
    bucket_width_ms: u32,
}

impl MatchScorer {
    pub fn new(bucket_width_ms: u32) -> Self {
        Self { bucket_width_ms }
    }

    /// Score every song that shares at least one hash with the query.
    ///
    /// Songs with zero shared hashes never appear in the output. Hash
    /// iteration is sorted so the result is identical run to run.
    pub fn score(
        &self,
        query: &HashMap<u32, FingerprintRecord>,
        stored: &HashMap<u32, Vec<Couple>>,
    ) -> HashMap<u32, MatchResult> {
        // song -> (query anchor, stored anchor) alignment pairs
        let mut alignments: HashMap<u32, Vec<(u32, u32)>> = HashMap::new();
        let mut earliest: HashMap<u32, u32> = HashMap::new();

        let mut hashes: Vec<u32> = query.keys().copied().collect();
        hashes.sort_unstable();

        for hash in hashes {
            let Some(couples) = stored.get(&hash) else {
                continue;
            };
            let query_ms = query[&hash].anchor_time_ms;

            for couple in couples {
                alignments
                    .entry(couple.song_id)
                    .or_default()
                    .push((query_ms, couple.anchor_time_ms));

                earliest
                    .entry(couple.song_id)
                    .and_modify(|t| *t = (*t).min(couple.anchor_time_ms))
                    .or_insert(couple.anchor_time_ms);
            }
        }

        let mut results = HashMap::new();
        for (song_id, pairs) in alignments {
            let tally = self.tally(&pairs, earliest[&song_id]);
            log::debug!(
                "song {}: {} shared hash hits, dominant bucket {}",
                song_id,
                pairs.len(),
                tally.score
            );
            results.insert(
                song_id,
                MatchResult {
                    song_id,
                    score: tally.score as f64,
                    timestamp_ms: tally.earliest_ms,
                },
            );
        }
        results
    }

    /// Histogram mode over offset buckets for one song.
    fn tally(&self, pairs: &[(u32, u32)], earliest_ms: u32) -> SongTally {
        let mut buckets: HashMap<i64, usize> = HashMap::new();

        for &(query_ms, stored_ms) in pairs {
            let offset = stored_ms as i64 - query_ms as i64;
            let bucket = offset.div_euclid(self.bucket_width_ms as i64);
            *buckets.entry(bucket).or_insert(0) += 1;
        }

        let score = buckets.values().copied().max().unwrap_or(0);
        SongTally {
            score,
            earliest_ms,
        }
    }
}

/// Order scored candidates for presentation: descending score, ties
/// broken by ascending song id so output is stable.
pub fn rank(scores: HashMap<u32, MatchResult>) -> Vec<MatchResult> {
    let mut ranked: Vec<MatchResult> = scores.into_values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.song_id.cmp(&b.song_id))
    });
    ranked
}
