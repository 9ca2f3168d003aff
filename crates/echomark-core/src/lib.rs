//! Echomark Core - Acoustic Duplicate Detection
//!
//! Identifies whether an audio clip matches previously registered
//! recordings using combinatorial peak-pair fingerprints and
//! time-coherence scoring. Front ends decode audio, then call
//! [`register_song`] or [`find_matches`] with mono PCM; persistence
//! goes through the [`FingerprintStore`] trait.

pub mod audio;
pub mod config;
pub mod engine;
pub mod fingerprint;
pub mod matching;
pub mod peaks;
pub mod spectrogram;
pub mod store;

pub use config::{AppConfig, ConfigError, EngineConfig, PostgresConfig};
pub use engine::{find_matches, register_song, EngineError, RegistrationReport};
pub use fingerprint::{FingerprintGenerator, FingerprintRecord, QUERY_SONG_ID};
pub use matching::{rank, MatchResult, MatchScorer};
pub use peaks::{Peak, PeakExtractor};
pub use spectrogram::{build_spectrogram, Spectrogram};
pub use store::{Couple, FingerprintStore, MemoryStore, PostgresStore, StoreError};
