use anyhow::{Context, Result};
use deadpool_postgres::Pool;

use crate::models::{CoupleRow, NewFingerprint};

/// Append one hash -> (song, anchor time) row.
///
/// The table carries no uniqueness constraint; duplicate rows from a
/// re-run registration are acceptable by contract.
pub async fn insert_fingerprint(pool: &Pool, fingerprint: &NewFingerprint) -> Result<()> {
    let client = pool.get().await?;

    client
        .execute(
            "INSERT INTO fingerprints (hash, song_id, anchor_time_ms)
             VALUES ($1, $2, $3)",
            &[
                &fingerprint.hash,
                &fingerprint.song_id,
                &fingerprint.anchor_time_ms,
            ],
        )
        .await
        .context("Failed to insert fingerprint")?;

    Ok(())
}

/// Fetch every stored couple for the given hash set in one round trip.
pub async fn get_couples(pool: &Pool, hashes: &[i64]) -> Result<Vec<CoupleRow>> {
    if hashes.is_empty() {
        return Ok(Vec::new());
    }

    let client = pool.get().await?;

    let rows = client
        .query(
            "SELECT hash, song_id, anchor_time_ms
             FROM fingerprints
             WHERE hash = ANY($1)",
            &[&hashes],
        )
        .await
        .context("Failed to query fingerprints by hash")?;

    let couples = rows
        .iter()
        .map(|row| CoupleRow {
            hash: row.get(0),
            song_id: row.get(1),
            anchor_time_ms: row.get(2),
        })
        .collect();

    Ok(couples)
}

/// Remove every row belonging to a song. Returns the row count.
pub async fn delete_song(pool: &Pool, song_id: i64) -> Result<u64> {
    let client = pool.get().await?;

    let deleted = client
        .execute("DELETE FROM fingerprints WHERE song_id = $1", &[&song_id])
        .await
        .context("Failed to delete song fingerprints")?;

    log::info!("deleted {} fingerprint rows for song {}", deleted, song_id);
    Ok(deleted)
}

/// Total stored rows, optionally restricted to one song.
pub async fn count_fingerprints(pool: &Pool, song_id: Option<i64>) -> Result<i64> {
    let client = pool.get().await?;

    let row = match song_id {
        Some(id) => {
            client
                .query_one(
                    "SELECT COUNT(*) FROM fingerprints WHERE song_id = $1",
                    &[&id],
                )
                .await
        }
        None => client.query_one("SELECT COUNT(*) FROM fingerprints", &[]).await,
    }
    .context("Failed to count fingerprints")?;

    Ok(row.get(0))
}
