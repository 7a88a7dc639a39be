//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode), and running migrations.

use std::path::Path;

use tokio_rusqlite::{params, Connection};

use crate::error::{GatewayError, Result};

/// Migration list: (version, SQL).
///
/// Migrations must be applied in order. The version number is an
/// incrementing integer used to track which migrations have been applied.
/// All statements are idempotent using CREATE IF NOT EXISTS.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    "CREATE TABLE IF NOT EXISTS image_assets (
         id        TEXT PRIMARY KEY,
         url       TEXT NOT NULL,
         stored_at INTEGER NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_image_assets_stored_at
         ON image_assets(stored_at);
     CREATE TABLE IF NOT EXISTS video_assets (
         id        TEXT PRIMARY KEY,
         url       TEXT NOT NULL,
         stored_at INTEGER NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_video_assets_stored_at
         ON video_assets(stored_at);
     CREATE TABLE IF NOT EXISTS response_cache (
         space       TEXT NOT NULL,
         request_key TEXT NOT NULL,
         status      INTEGER NOT NULL,
         headers     TEXT NOT NULL,
         body        BLOB NOT NULL,
         opaque      INTEGER NOT NULL DEFAULT 0,
         stored_at   INTEGER NOT NULL,
         PRIMARY KEY (space, request_key)
     );",
)];

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Cloning shares the same connection.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| GatewayError::Store(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same
    /// pragma configuration as file-based databases.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| GatewayError::Store(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;",
            )?;
            Ok(())
        })
        .await
        .map_err(GatewayError::Store)?;

        run_migrations(&conn).await?;

        Ok(Self { conn })
    }
}

/// Run any pending migrations.
///
/// Creates the _migrations table if it doesn't exist, checks the current
/// version, and applies any migrations that haven't been run yet.
async fn run_migrations(conn: &Connection) -> Result<()> {
    conn.call(|conn| -> std::result::Result<(), GatewayError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(GatewayError::from)?;

        let current: i64 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| {
                row.get(0)
            })
            .map_err(GatewayError::from)?;

        for (version, sql) in MIGRATIONS {
            if *version > current {
                conn.execute_batch(sql)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version, chrono::Utc::now().to_rfc3339()],
                )
                .map_err(GatewayError::from)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(GatewayError::from)
}
