use serde::{Deserialize, Serialize};

/// One stored hash association as read back from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoupleRow {
    pub hash: i64,
    pub song_id: i64,
    pub anchor_time_ms: i64,
}

/// Input structure for appending one fingerprint row
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewFingerprint {
    pub hash: i64,
    pub song_id: i64,
    pub anchor_time_ms: i64,
}
