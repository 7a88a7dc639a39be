//! Assetgate - A caching gateway for CMS-backed sites
//!
//! Provides layered asset resolution (in-memory slots, persistent store,
//! remote lookup) and classified response caching at the network boundary.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod resolve;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_sweep_task;
