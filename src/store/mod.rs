//! Persistent Store Module
//!
//! SQLite-backed persistence shared by the asset resolver (ID-to-URL
//! mappings with a time-ordered index) and the gateway (named response-cache
//! spaces). Database operations run on a background thread via
//! tokio-rusqlite; per-statement atomicity is all the coordination the
//! independent, idempotent writes need.

mod db;
mod entries;

pub use db::CacheDb;
pub use entries::{AssetEntry, AssetKind};
