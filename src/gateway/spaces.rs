//! Named Response-Cache Spaces
//!
//! Stored response snapshots partitioned into four named spaces. Space
//! names carry a version suffix; rotating a name across a deploy drops the
//! whole space at activation. Entries are never evicted individually by
//! age.

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Method, Response, StatusCode};
use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};
use url::Url;

use crate::error::{GatewayError, Result};
use crate::store::CacheDb;

// == Space Names ==
/// The four response-cache spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Page shell: navigations, scripts, styles, fonts
    Shell,
    /// Image responses
    Images,
    /// Video responses
    Videos,
    /// Document-database API responses
    Api,
}

impl Space {
    /// Versioned space name as stored on disk. Bump the suffix to drop a
    /// space wholesale on the next activation.
    pub fn name(self) -> &'static str {
        match self {
            Space::Shell => "assetgate-shell-v1",
            Space::Images => "assetgate-images-v1",
            Space::Videos => "assetgate-videos-v1",
            Space::Api => "assetgate-api-v1",
        }
    }

    /// Every space the current build recognizes; anything else found on
    /// disk at activation is a stale version and gets deleted.
    pub fn recognized() -> [&'static str; 4] {
        [
            Space::Shell.name(),
            Space::Images.name(),
            Space::Videos.name(),
            Space::Api.name(),
        ]
    }
}

/// Request identity inside a space: method plus full URL. GET-only by
/// construction, the method is kept in the key anyway so identity is
/// self-describing.
pub fn request_key(method: &Method, url: &Url) -> String {
    format!("{} {}", method, url)
}

// == Response Snapshot ==
/// A stored (or just-fetched) HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    /// Header pairs; non-UTF-8 values are dropped at capture time
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Cross-origin response without a read grant; relayed, never stored
    pub opaque: bool,
}

impl ResponseSnapshot {
    /// Status in the OK range, not partial content, not opaque.
    ///
    /// Only responses passing this check may be written to a space.
    pub fn is_cacheable(&self) -> bool {
        (200..300).contains(&self.status) && self.status != 206 && !self.opaque
    }

    /// The synthetic response returned when cache-first has neither a
    /// stored match nor a reachable network.
    pub fn network_error() -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT.as_u16(),
            headers: vec![(
                header::CONTENT_TYPE.to_string(),
                "text/plain".to_string(),
            )],
            body: Bytes::from_static(b"Network error"),
            opaque: false,
        }
    }

    /// Renders the snapshot as an HTTP response.
    pub fn into_response(self) -> Response<Body> {
        let mut builder = Response::builder()
            .status(StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));

        for (name, value) in &self.headers {
            let parsed = (
                name.parse::<HeaderName>(),
                HeaderValue::from_str(value),
            );
            if let (Ok(name), Ok(value)) = parsed {
                builder = builder.header(name, value);
            }
        }

        builder
            .body(Body::from(self.body))
            .unwrap_or_else(|_| Response::new(Body::empty()))
    }
}

// == Space Persistence ==
impl CacheDb {
    /// Stored match for a request key, if any. No freshness check.
    pub async fn get_response(&self, space: Space, key: &str) -> Result<Option<ResponseSnapshot>> {
        let key = key.to_string();
        let space = space.name();
        self.conn
            .call(move |conn| -> std::result::Result<Option<ResponseSnapshot>, GatewayError> {
                let result = conn.query_row(
                    "SELECT status, headers, body, opaque FROM response_cache
                     WHERE space = ?1 AND request_key = ?2",
                    params![space, key],
                    |row| {
                        Ok((
                            row.get::<_, u16>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Vec<u8>>(2)?,
                            row.get::<_, i64>(3)? != 0,
                        ))
                    },
                );

                match result {
                    Ok((status, headers, body, opaque)) => {
                        let headers: Vec<(String, String)> =
                            serde_json::from_str(&headers).unwrap_or_default();
                        Ok(Some(ResponseSnapshot {
                            status,
                            headers,
                            body: Bytes::from(body),
                            opaque,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Stores a snapshot under a request key, overwriting any previous one.
    pub async fn put_response(
        &self,
        space: Space,
        key: &str,
        snapshot: &ResponseSnapshot,
    ) -> Result<()> {
        let key = key.to_string();
        let space = space.name();
        let status = snapshot.status;
        let headers = serde_json::to_string(&snapshot.headers)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        let body = snapshot.body.to_vec();
        let opaque = snapshot.opaque as i64;
        let stored_at = chrono::Utc::now().timestamp_millis();

        self.conn
            .call(move |conn| -> std::result::Result<(), GatewayError> {
                conn.execute(
                    "INSERT INTO response_cache
                         (space, request_key, status, headers, body, opaque, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(space, request_key) DO UPDATE SET
                         status = excluded.status,
                         headers = excluded.headers,
                         body = excluded.body,
                         opaque = excluded.opaque,
                         stored_at = excluded.stored_at",
                    params![space, key, status, headers, body, opaque, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Every distinct space name currently on disk.
    pub async fn list_spaces(&self) -> Result<Vec<String>> {
        self.conn
            .call(|conn| -> std::result::Result<Vec<String>, GatewayError> {
                let mut stmt =
                    conn.prepare("SELECT DISTINCT space FROM response_cache ORDER BY space")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Deletes every space whose name is not in `keep`.
    ///
    /// Returns the number of spaces dropped. Runs at activation to clean up
    /// spaces left behind by previous versions.
    pub async fn delete_stale_spaces(&self, keep: &[&str]) -> Result<u64> {
        let keep: Vec<String> = keep.iter().map(|s| s.to_string()).collect();
        self.conn
            .call(move |conn| -> std::result::Result<u64, GatewayError> {
                let mut stmt = conn.prepare("SELECT DISTINCT space FROM response_cache")?;
                let existing = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                drop(stmt);

                let mut dropped = 0;
                for space in existing {
                    if !keep.contains(&space) {
                        conn.execute("DELETE FROM response_cache WHERE space = ?1", params![space])?;
                        dropped += 1;
                    }
                }
                Ok(dropped)
            })
            .await
            .map_err(GatewayError::from)
    }

    /// Number of snapshots stored in a space.
    pub async fn count_responses(&self, space: Space) -> Result<u64> {
        let space = space.name();
        self.conn
            .call(move |conn| -> std::result::Result<u64, GatewayError> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM response_cache WHERE space = ?1",
                    params![space],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(GatewayError::from)
    }
}
