//! Response models for the gateway API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies. The API takes no request bodies;
//! everything arrives in the path.

pub mod responses;

// Re-export commonly used types
pub use responses::{
    ErrorResponse, HealthResponse, InvalidateResponse, ResolveResponse, StatsResponse,
};
