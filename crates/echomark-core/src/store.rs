//! Fingerprint store trait and implementations
//!
//! The catalog is an append-only multimap from hash to
//! (song, anchor time) couples. The engine needs exactly two
//! operations: a fire-and-forget insert and a bulk lookup over a hash
//! set. Everything else about the persisted layout is the backend's
//! business.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::config::PostgresConfig;

/// One stored association for a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Couple {
    pub song_id: u32,
    pub anchor_time_ms: u32,
}

/// The store's I/O boundary failed. Fatal for queries; collected and
/// reported per-record during registration.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fingerprint store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Abstract fingerprint store
///
/// Inserts are idempotent and order-independent, so a partially
/// applied registration is always safely resumable by re-running it.
/// `batch_get` must resolve the entire hash set in one round trip.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Append one hash -> (song, anchor time) association.
    async fn insert(&self, hash: u32, song_id: u32, anchor_time_ms: u32)
        -> Result<(), StoreError>;

    /// Resolve every hash in one bulk lookup. Hashes with no stored
    /// couples are absent from the result map.
    async fn batch_get(&self, hashes: &[u32]) -> Result<HashMap<u32, Vec<Couple>>, StoreError>;
}

/// In-process store backed by a hash map. Used for tests and for
/// ephemeral single-run catalogs.
#[derive(Default)]
pub struct MemoryStore {
    index: Mutex<HashMap<u32, Vec<Couple>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored couples across all hashes.
    pub fn len(&self) -> usize {
        self.index.lock().map(|m| m.values().map(Vec::len).sum()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FingerprintStore for MemoryStore {
    async fn insert(
        &self,
        hash: u32,
        song_id: u32,
        anchor_time_ms: u32,
    ) -> Result<(), StoreError> {
        let mut index = self.index.lock().map_err(StoreError::unavailable)?;
        index.entry(hash).or_default().push(Couple {
            song_id,
            anchor_time_ms,
        });
        Ok(())
    }

    async fn batch_get(&self, hashes: &[u32]) -> Result<HashMap<u32, Vec<Couple>>, StoreError> {
        let index = self.index.lock().map_err(StoreError::unavailable)?;
        let mut out = HashMap::new();
        for &hash in hashes {
            if let Some(couples) = index.get(&hash) {
                out.insert(hash, couples.clone());
            }
        }
        Ok(out)
    }
}

/// PostgreSQL-backed store
pub struct PostgresStore {
    pool: deadpool_postgres::Pool,
}

impl PostgresStore {
    /// Connect, verify the connection, and make sure the schema
    /// exists.
    pub async fn new(config: &PostgresConfig) -> anyhow::Result<Self> {
        let pool = echomark_db::create_pool(
            &config.host,
            config.port,
            &config.database,
            &config.user,
            &config.password,
            config.max_connections,
        )?;

        echomark_db::test_connection(&pool).await?;
        echomark_db::init_schema(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl FingerprintStore for PostgresStore {
    async fn insert(
        &self,
        hash: u32,
        song_id: u32,
        anchor_time_ms: u32,
    ) -> Result<(), StoreError> {
        let row = echomark_db::NewFingerprint {
            hash: hash as i64,
            song_id: song_id as i64,
            anchor_time_ms: anchor_time_ms as i64,
        };
        echomark_db::insert_fingerprint(&self.pool, &row)
            .await
            .map_err(StoreError::unavailable)
    }

    async fn batch_get(&self, hashes: &[u32]) -> Result<HashMap<u32, Vec<Couple>>, StoreError> {
        let wanted: Vec<i64> = hashes.iter().map(|&h| h as i64).collect();

        let rows = echomark_db::get_couples(&self.pool, &wanted)
            .await
            .map_err(StoreError::unavailable)?;

        let mut out: HashMap<u32, Vec<Couple>> = HashMap::new();
        for row in rows {
            out.entry(row.hash as u32).or_default().push(Couple {
                song_id: row.song_id as u32,
                anchor_time_ms: row.anchor_time_ms as u32,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.insert(10, 1, 100).await.unwrap();
        store.insert(10, 2, 250).await.unwrap();
        store.insert(20, 1, 300).await.unwrap();

        let out = store.batch_get(&[10, 20, 30]).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[&10],
            vec![
                Couple { song_id: 1, anchor_time_ms: 100 },
                Couple { song_id: 2, anchor_time_ms: 250 },
            ]
        );
        assert!(!out.contains_key(&30));
    }

    #[tokio::test]
    async fn duplicate_inserts_are_accepted() {
        let store = MemoryStore::new();
        store.insert(10, 1, 100).await.unwrap();
        store.insert(10, 1, 100).await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
