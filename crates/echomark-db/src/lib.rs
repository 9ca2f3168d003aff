//! Echomark Database Layer
//!
//! PostgreSQL persistence for the fingerprint catalog: an append-only
//! multimap from 32-bit hash to (song, anchor time) rows.

pub mod connection;
pub mod models;
pub mod operations;

pub use connection::{create_pool, init_schema, test_connection, DbPool};
pub use models::{CoupleRow, NewFingerprint};
pub use operations::{
    count_fingerprints, delete_song, get_couples, insert_fingerprint,
};
