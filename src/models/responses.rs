//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::gateway::GatewayStatsSnapshot;
use crate::resolve::ResolveStatsSnapshot;
use crate::store::AssetKind;

/// Response body for asset resolution (GET /resolve/:kind/:ref)
///
/// `url` is null when the reference could not be resolved; resolution
/// failures never surface as error statuses.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    /// The reference as received
    pub reference: String,
    /// The resolved display URL, if any
    pub url: Option<String>,
}

impl ResolveResponse {
    /// Creates a new ResolveResponse
    pub fn new(reference: impl Into<String>, url: Option<String>) -> Self {
        Self {
            reference: reference.into(),
            url,
        }
    }
}

/// Response body for explicit invalidation (DELETE /assets/:kind/:id)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The asset kind the mapping belonged to
    pub kind: AssetKind,
    /// The invalidated asset ID
    pub id: String,
}

impl InvalidateResponse {
    /// Creates a new InvalidateResponse
    pub fn new(kind: AssetKind, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Mapping for '{}' invalidated", id),
            kind,
            id,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Image resolver tier counters
    pub images: ResolveStatsSnapshot,
    /// Video resolver tier counters
    pub videos: ResolveStatsSnapshot,
    /// Interception layer counters
    pub gateway: GatewayStatsSnapshot,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
