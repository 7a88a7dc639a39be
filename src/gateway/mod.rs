//! Response Caching Gateway Module
//!
//! The request-interception layer: every GET flowing through the service is
//! classified into a resource class and served through cache-first or
//! network-first against one of four named cache spaces. Non-GET traffic,
//! admin paths, and anything unrecognized pass through untouched.

mod classify;
mod service;
mod spaces;
mod strategy;
mod upstream;


pub use classify::{ClassifyRules, RequestClass};
pub use service::{Gateway, LifecyclePhase};
pub use spaces::{request_key, ResponseSnapshot, Space};
pub use strategy::{cache_first, network_first, GatewayStats, GatewayStatsSnapshot};
pub use upstream::{HttpUpstream, OutboundRequest, Upstream};
