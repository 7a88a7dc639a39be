//! API Module
//!
//! HTTP handlers and routing for the gateway.
//!
//! # Endpoints
//! - `GET /resolve/:kind/:reference` - Resolve an asset reference to a URL
//! - `DELETE /invalidate/:kind/:id` - Drop a persisted mapping
//! - `GET /stats` - Resolver and gateway counters
//! - `GET /health` - Health check endpoint
//! - everything else - the interception boundary (classified caching or
//!   passthrough)

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
