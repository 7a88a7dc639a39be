//! Fetch Strategies
//!
//! The two ways an intercepted request is served against its cache space.
//! Cache-first never surfaces a failure (worst case is a synthetic 408);
//! network-first propagates the fetch error only when there is no stored
//! match to show instead.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, warn};

use super::spaces::{request_key, ResponseSnapshot, Space};
use super::upstream::{OutboundRequest, Upstream};
use crate::error::Result;
use crate::store::CacheDb;

// == Cache First ==
/// Serve from the space when a match exists; otherwise fetch, store when
/// cacheable, and return. Returns a synthetic 408 when the network fails
/// and nothing is stored, so callers always receive a response.
///
/// A stored match is returned as-is: no freshness check, no background
/// revalidation.
pub async fn cache_first(
    db: &CacheDb,
    upstream: &dyn Upstream,
    space: Space,
    request: &OutboundRequest,
    stats: &GatewayStats,
) -> ResponseSnapshot {
    let key = request_key(&request.method, &request.url);

    match db.get_response(space, &key).await {
        Ok(Some(stored)) => {
            stats.record_cache_hit();
            return stored;
        }
        Ok(None) => {}
        Err(err) => {
            warn!(space = space.name(), %err, "space read failed, treating as miss");
        }
    }
    stats.record_cache_miss();

    if !is_http(request) {
        // Unstorable scheme: fetch and relay without caching.
        return match upstream.fetch(request).await {
            Ok(fetched) => fetched,
            Err(err) => {
                stats.record_network_failure();
                debug!(%err, "fetch failed for non-HTTP scheme");
                ResponseSnapshot::network_error()
            }
        };
    }

    match upstream.fetch(request).await {
        Ok(fetched) => {
            store_if_cacheable(db, space, &key, &fetched).await;
            fetched
        }
        Err(err) => {
            stats.record_network_failure();
            debug!(space = space.name(), %err, "fetch failed with empty cache");
            ResponseSnapshot::network_error()
        }
    }
}

// == Network First ==
/// Fetch first, storing the answer when cacheable; fall back to the stored
/// match on failure. When network and cache both come up empty this is the
/// one path that propagates the fetch error, unchanged.
pub async fn network_first(
    db: &CacheDb,
    upstream: &dyn Upstream,
    space: Space,
    request: &OutboundRequest,
    stats: &GatewayStats,
) -> Result<ResponseSnapshot> {
    if !is_http(request) {
        return upstream.fetch(request).await;
    }

    let key = request_key(&request.method, &request.url);

    match upstream.fetch(request).await {
        Ok(fetched) => {
            store_if_cacheable(db, space, &key, &fetched).await;
            Ok(fetched)
        }
        Err(err) => {
            stats.record_network_failure();
            match db.get_response(space, &key).await {
                Ok(Some(stored)) => {
                    stats.record_cache_hit();
                    Ok(stored)
                }
                Ok(None) => {
                    stats.record_cache_miss();
                    Err(err)
                }
                Err(store_err) => {
                    warn!(space = space.name(), %store_err, "fallback read failed");
                    stats.record_cache_miss();
                    Err(err)
                }
            }
        }
    }
}

fn is_http(request: &OutboundRequest) -> bool {
    matches!(request.url.scheme(), "http" | "https")
}

async fn store_if_cacheable(db: &CacheDb, space: Space, key: &str, snapshot: &ResponseSnapshot) {
    if !snapshot.is_cacheable() {
        return;
    }
    if let Err(err) = db.put_response(space, key, snapshot).await {
        // Quota and similar storage failures never surface to the caller.
        warn!(space = space.name(), %err, "failed to store response");
    }
}

// == Gateway Stats ==
/// Counters for how intercepted requests were served.
#[derive(Debug, Default)]
pub struct GatewayStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    network_failures: AtomicU64,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of the counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub network_failures: u64,
}
