//! Expiry Sweep Task
//!
//! Background task that deletes aged asset mappings from the persistent
//! store. The sweep is one of two independent expiry mechanisms: lookups
//! also purge aged entries lazily, and the two are idempotent with no
//! ordering between them.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::resolve::ASSET_EXPIRY_MS;
use crate::store::{AssetKind, CacheDb};

/// Spawns the background expiry sweep.
///
/// The first sweep waits out `delay` so it never competes with startup
/// work; after that the sweep repeats every `interval`. Each run is
/// best-effort: store failures are logged and swallowed, and the next run
/// starts from scratch.
///
/// # Arguments
/// * `db` - shared store handle
/// * `delay` - wait before the first sweep
/// * `interval` - wait between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_sweep_task(db: CacheDb, delay: Duration, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            delay_secs = delay.as_secs(),
            interval_secs = interval.as_secs(),
            "starting expiry sweep task"
        );

        tokio::time::sleep(delay).await;

        loop {
            let removed = sweep_once(&db).await;
            if removed > 0 {
                info!(removed, "expiry sweep removed aged asset entries");
            } else {
                debug!("expiry sweep found no aged entries");
            }

            tokio::time::sleep(interval).await;
        }
    })
}

/// One sweep over both kinds. Returns how many entries were deleted.
async fn sweep_once(db: &CacheDb) -> u64 {
    let cutoff = Utc::now().timestamp_millis() - ASSET_EXPIRY_MS;
    let mut removed = 0;

    for kind in [AssetKind::Image, AssetKind::Video] {
        match db.purge_assets_older_than(kind, cutoff).await {
            Ok(count) => removed += count,
            Err(err) => {
                debug!(kind = kind.as_str(), %err, "expiry sweep failed, will retry next run");
            }
        }
    }

    removed
}
