//! API Handlers
//!
//! HTTP request handlers for the gateway's own endpoints, plus the fallback
//! that feeds everything else into the interception layer.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    response::Response,
    Json,
};

use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;
use crate::models::{HealthResponse, InvalidateResponse, ResolveResponse, StatsResponse};
use crate::resolve::AssetResolver;
use crate::store::AssetKind;

/// Application state shared across all handlers.
///
/// One resolver per media kind plus the gateway; all constructed once at
/// startup and shared by reference.
#[derive(Clone)]
pub struct AppState {
    /// Image reference resolver
    pub images: Arc<AssetResolver>,
    /// Video reference resolver
    pub videos: Arc<AssetResolver>,
    /// Response caching gateway
    pub gateway: Arc<Gateway>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(images: AssetResolver, videos: AssetResolver, gateway: Gateway) -> Self {
        Self {
            images: Arc::new(images),
            videos: Arc::new(videos),
            gateway: Arc::new(gateway),
        }
    }

    fn resolver(&self, kind: AssetKind) -> &AssetResolver {
        match kind {
            AssetKind::Image => &self.images,
            AssetKind::Video => &self.videos,
        }
    }
}

fn parse_kind(segment: &str) -> Result<AssetKind> {
    AssetKind::from_segment(segment)
        .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown asset kind '{segment}'")))
}

/// Handler for GET /resolve/:kind/:reference
///
/// Resolves a reference to a displayable URL. References that contain
/// slashes (ready-to-use URLs) must arrive percent-encoded. The body
/// always carries a `url` field; it is null on a miss, and resolution
/// failures never become error statuses.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Path((kind, reference)): Path<(String, String)>,
) -> Result<Json<ResolveResponse>> {
    let kind = parse_kind(&kind)?;
    let url = state.resolver(kind).resolve(&reference).await;

    Ok(Json(ResolveResponse::new(reference, url)))
}

/// Handler for DELETE /invalidate/:kind/:id
///
/// Explicitly drops a persisted mapping (and its in-memory slot) so the
/// next resolution starts from the source of truth.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<InvalidateResponse>> {
    let kind = parse_kind(&kind)?;
    let existed = state.resolver(kind).invalidate(&id).await?;
    if !existed {
        return Err(GatewayError::NotFound(id));
    }

    Ok(Json(InvalidateResponse::new(kind, id)))
}

/// Handler for GET /stats
///
/// Returns resolver tier counters and interception counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        images: state.images.stats(),
        videos: state.videos.stats(),
        gateway: state.gateway.stats(),
    })
}

/// Handler for GET /health
///
/// Returns health status of the gateway.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback handler: the interception boundary.
///
/// Every request no other route claimed flows through classification and
/// the fetch strategies.
pub async fn intercept_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response> {
    state.gateway.handle(request).await
}
