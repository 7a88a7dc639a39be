//! Gateway Service
//!
//! Owns the interception lifecycle and dispatches classified requests to
//! their strategies. The lifecycle mirrors a fresh deploy taking over:
//! install warms the shell space from the manifest, activation drops cache
//! spaces left by previous versions, and the gateway then claims all
//! traffic immediately; nothing waits on a prior instance draining.

use std::sync::{Arc, RwLock};

use axum::body::Body;
use axum::http::Uri;
use axum::response::Response;
use tracing::{info, warn};
use url::Url;

use super::classify::{ClassifyRules, RequestClass};
use super::spaces::{request_key, Space};
use super::strategy::{cache_first, network_first, GatewayStats, GatewayStatsSnapshot};
use super::upstream::{OutboundRequest, Upstream};
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::store::CacheDb;

/// Largest request body relayed on passthrough.
const MAX_PASSTHROUGH_BODY: usize = 64 * 1024 * 1024;

// == Lifecycle ==
/// Gateway lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Pre-populating the shell space; failures tolerated
    Installing,
    /// Dropping stale cache spaces
    Activating,
    /// Intercepting traffic
    Active,
}

// == Gateway ==
/// The response-caching gateway.
pub struct Gateway {
    db: CacheDb,
    upstream: Arc<dyn Upstream>,
    rules: ClassifyRules,
    origin: Url,
    shell_manifest: Vec<String>,
    phase: RwLock<LifecyclePhase>,
    stats: GatewayStats,
}

impl Gateway {
    // == Constructor ==
    pub fn new(config: &Config, db: CacheDb, upstream: Arc<dyn Upstream>) -> Result<Self> {
        let origin = Url::parse(&config.upstream_origin).map_err(|e| {
            GatewayError::Internal(format!("invalid upstream origin {}: {e}", config.upstream_origin))
        })?;

        Ok(Self {
            db,
            upstream,
            rules: ClassifyRules::from_config(config),
            origin,
            shell_manifest: config.shell_manifest.clone(),
            phase: RwLock::new(LifecyclePhase::Installing),
            stats: GatewayStats::new(),
        })
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self
            .phase
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Point-in-time counters for the stats endpoint.
    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    // == Bootstrap ==
    /// Runs install then activation. Called once at startup, before the
    /// server accepts traffic.
    pub async fn bootstrap(&self) -> Result<()> {
        self.install().await;
        self.activate().await
    }

    /// Pre-populates the shell space from the manifest.
    ///
    /// Each entry fetch is best-effort: failures are logged and skipped,
    /// and the transition out of Installing always succeeds.
    async fn install(&self) {
        info!(entries = self.shell_manifest.len(), "installing: warming shell space");

        for entry in &self.shell_manifest {
            let target = match self.origin.join(entry) {
                Ok(target) => target,
                Err(err) => {
                    warn!(%entry, %err, "invalid shell manifest entry");
                    continue;
                }
            };

            let request = OutboundRequest::get(target);
            let key = request_key(&request.method, &request.url);
            match self.upstream.fetch(&request).await {
                Ok(snapshot) if snapshot.is_cacheable() => {
                    if let Err(err) = self.db.put_response(Space::Shell, &key, &snapshot).await {
                        warn!(%entry, %err, "failed to store shell entry");
                    }
                }
                Ok(snapshot) => {
                    warn!(%entry, status = snapshot.status, "shell entry not cacheable, skipped");
                }
                Err(err) => {
                    warn!(%entry, %err, "failed to fetch shell entry");
                }
            }
        }
    }

    /// Drops every cache space not recognized by this build, then starts
    /// intercepting.
    async fn activate(&self) -> Result<()> {
        self.set_phase(LifecyclePhase::Activating);

        let dropped = self.db.delete_stale_spaces(&Space::recognized()).await?;
        if dropped > 0 {
            info!(dropped, "dropped stale cache spaces");
        }

        self.set_phase(LifecyclePhase::Active);
        info!("gateway active, intercepting traffic");
        Ok(())
    }

    fn set_phase(&self, phase: LifecyclePhase) {
        *self
            .phase
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = phase;
    }

    // == Interception ==
    /// Serves one request through classification and the strategies.
    ///
    /// Bypass classes (non-GET, admin paths, unmatched requests) are
    /// relayed untouched. The only error this returns to the HTTP layer is
    /// a failed passthrough or network-first fetch with nothing cached.
    pub async fn handle(&self, request: axum::extract::Request) -> Result<Response> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, MAX_PASSTHROUGH_BODY)
            .await
            .map_err(|e| GatewayError::InvalidRequest(format!("unreadable body: {e}")))?;

        let outbound = OutboundRequest {
            url: self.target_url(&parts.uri)?,
            method: parts.method,
            headers: parts.headers,
            body,
        };

        if self.phase() != LifecyclePhase::Active {
            // Not yet claimed: relay without cache involvement.
            return Ok(self.upstream.fetch(&outbound).await?.into_response());
        }

        let class = self
            .rules
            .classify(&outbound.method, &outbound.url, &outbound.headers);

        let response = match class {
            RequestClass::Bypass => self.upstream.fetch(&outbound).await?.into_response(),
            RequestClass::CacheFirst(space) => {
                cache_first(&self.db, self.upstream.as_ref(), space, &outbound, &self.stats)
                    .await
                    .into_response()
            }
            RequestClass::NetworkFirst(space) => {
                network_first(&self.db, self.upstream.as_ref(), space, &outbound, &self.stats)
                    .await?
                    .into_response()
            }
        };

        Ok(response)
    }

    /// Target URL for an incoming request: absolute-form URIs are honored
    /// as-is (which is what gives the hostname classification rules their
    /// meaning); origin-form paths are joined against the upstream origin.
    fn target_url(&self, uri: &Uri) -> Result<Url> {
        if uri.scheme().is_some() {
            return Url::parse(&uri.to_string())
                .map_err(|e| GatewayError::InvalidRequest(format!("unparseable URI: {e}")));
        }

        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        self.origin
            .join(path)
            .map_err(|e| GatewayError::InvalidRequest(format!("unjoinable path {path}: {e}")))
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("origin", &self.origin.as_str())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
