//! Asset mapping CRUD operations.
//!
//! One table per asset kind, keyed by the opaque asset ID. The `stored_at`
//! column (Unix milliseconds) carries the entry's creation time and is
//! indexed so aged entries can be range-deleted by the expiry sweep.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

use super::db::CacheDb;
use crate::error::{GatewayError, Result};

// == Asset Kind ==
/// The two media kinds the resolver caches, each with its own table and
/// in-memory tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    /// Table holding this kind's persisted mappings.
    fn table(self) -> &'static str {
        match self {
            AssetKind::Image => "image_assets",
            AssetKind::Video => "video_assets",
        }
    }

    /// Parses the path segment used by the HTTP API ("image" / "video").
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "image" => Some(AssetKind::Image),
            "video" => Some(AssetKind::Video),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }
}

// == Asset Entry ==
/// A persisted ID-to-URL mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Opaque asset ID
    pub id: String,
    /// Resolved display URL
    pub url: String,
    /// Creation time, Unix milliseconds
    pub stored_at: i64,
}

impl CacheDb {
    /// Get a persisted mapping by ID.
    ///
    /// Returns None if the ID has never been resolved (or was invalidated).
    /// Age is not checked here; the resolver applies the expiry window.
    pub async fn get_asset(&self, kind: AssetKind, id: &str) -> Result<Option<AssetEntry>> {
        let id = id.to_string();
        let sql = format!(
            "SELECT id, url, stored_at FROM {} WHERE id = ?1",
            kind.table()
        );
        self.conn
            .call(move |conn| -> std::result::Result<Option<AssetEntry>, GatewayError> {
                let result = conn.query_row(&sql, params![id], |row| {
                    Ok(AssetEntry {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        stored_at: row.get(2)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Insert or overwrite a mapping.
    ///
    /// Writes are idempotent overwrites keyed by ID; a re-resolution
    /// refreshes both the URL and the creation timestamp.
    pub async fn put_asset(&self, kind: AssetKind, entry: &AssetEntry) -> Result<()> {
        let entry = entry.clone();
        let sql = format!(
            "INSERT INTO {} (id, url, stored_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 url = excluded.url,
                 stored_at = excluded.stored_at",
            kind.table()
        );
        self.conn
            .call(move |conn| -> std::result::Result<(), GatewayError> {
                conn.execute(&sql, params![entry.id, entry.url, entry.stored_at])?;
                Ok(())
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Delete a mapping by ID.
    ///
    /// Returns true when a row was removed.
    pub async fn delete_asset(&self, kind: AssetKind, id: &str) -> Result<bool> {
        let id = id.to_string();
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        self.conn
            .call(move |conn| -> std::result::Result<bool, GatewayError> {
                let deleted = conn.execute(&sql, params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Delete every mapping stored strictly before `cutoff` (Unix ms).
    ///
    /// Returns the number of deleted entries. Range deletion goes through
    /// the `stored_at` index.
    pub async fn purge_assets_older_than(&self, kind: AssetKind, cutoff: i64) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE stored_at < ?1", kind.table());
        self.conn
            .call(move |conn| -> std::result::Result<u64, GatewayError> {
                let deleted = conn.execute(&sql, params![cutoff])?;
                Ok(deleted as u64)
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Number of persisted mappings for a kind.
    pub async fn count_assets(&self, kind: AssetKind) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        self.conn
            .call(move |conn| -> std::result::Result<u64, GatewayError> {
                let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(GatewayError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, url: &str, stored_at: i64) -> AssetEntry {
        AssetEntry {
            id: id.to_string(),
            url: url.to_string(),
            stored_at,
        }
    }

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let e = entry("abc123", "https://cdn.example.com/abc.jpg", 1_000);

        db.put_asset(AssetKind::Image, &e).await.unwrap();
        let got = db.get_asset(AssetKind::Image, "abc123").await.unwrap();

        assert_eq!(got, Some(e));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let got = db.get_asset(AssetKind::Image, "nope").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_kinds_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_asset(AssetKind::Image, &entry("shared-id", "https://a/img.jpg", 1))
            .await
            .unwrap();

        assert!(db
            .get_asset(AssetKind::Video, "shared-id")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_by_id() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_asset(AssetKind::Video, &entry("v1", "https://a/old.mp4", 1))
            .await
            .unwrap();
        db.put_asset(AssetKind::Video, &entry("v1", "https://a/new.mp4", 2))
            .await
            .unwrap();

        let got = db.get_asset(AssetKind::Video, "v1").await.unwrap().unwrap();
        assert_eq!(got.url, "https://a/new.mp4");
        assert_eq!(got.stored_at, 2);
        assert_eq!(db.count_assets(AssetKind::Video).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_asset(AssetKind::Image, &entry("gone", "https://a/x.png", 1))
            .await
            .unwrap();

        assert!(db.delete_asset(AssetKind::Image, "gone").await.unwrap());
        assert!(!db.delete_asset(AssetKind::Image, "gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_older_than_is_strict() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_asset(AssetKind::Image, &entry("old", "https://a/old.png", 100))
            .await
            .unwrap();
        db.put_asset(AssetKind::Image, &entry("edge", "https://a/edge.png", 200))
            .await
            .unwrap();
        db.put_asset(AssetKind::Image, &entry("new", "https://a/new.png", 300))
            .await
            .unwrap();

        let purged = db
            .purge_assets_older_than(AssetKind::Image, 200)
            .await
            .unwrap();

        assert_eq!(purged, 1);
        assert!(db.get_asset(AssetKind::Image, "old").await.unwrap().is_none());
        assert!(db.get_asset(AssetKind::Image, "edge").await.unwrap().is_some());
        assert!(db.get_asset(AssetKind::Image, "new").await.unwrap().is_some());
    }

    #[test]
    fn test_kind_from_segment() {
        assert_eq!(AssetKind::from_segment("image"), Some(AssetKind::Image));
        assert_eq!(AssetKind::from_segment("video"), Some(AssetKind::Video));
        assert_eq!(AssetKind::from_segment("audio"), None);
    }
}
