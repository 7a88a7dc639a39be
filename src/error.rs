//! Error types for the caching gateway
//!
//! Provides unified error handling using thiserror.
//!
//! Cache misses are not errors anywhere in this crate: an unknown asset ID,
//! an expired persisted entry, or an absent response snapshot all surface as
//! `None`/no-match values. The variants here cover real faults (storage,
//! upstream I/O, malformed requests) at the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_rusqlite::rusqlite;

// == Gateway Error Enum ==
/// Unified error type for the caching gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Requested entry not found (explicit invalidation of an unknown ID)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistent store operation failed
    #[error("Store error: {0}")]
    Store(tokio_rusqlite::Error),

    /// Upstream fetch failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Store Error Conversions ==
impl From<tokio_rusqlite::Error<GatewayError>> for GatewayError {
    fn from(err: tokio_rusqlite::Error<GatewayError>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => {
                GatewayError::Store(tokio_rusqlite::Error::ConnectionClosed)
            }
            tokio_rusqlite::Error::Close(c) => GatewayError::Store(tokio_rusqlite::Error::Close(c)),
            _ => GatewayError::Store(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for GatewayError {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        GatewayError::Store(err)
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        GatewayError::Store(tokio_rusqlite::Error::Error(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            GatewayError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            GatewayError::Store(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            // The one unmasked failure path: network-first with nothing
            // cached renders as a bad gateway.
            GatewayError::Upstream(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            GatewayError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;
