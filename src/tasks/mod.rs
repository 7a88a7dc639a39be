//! Background Tasks Module
//!
//! Contains background tasks that run periodically during gateway operation.
//!
//! # Tasks
//! - Expiry sweep: range-deletes persisted asset mappings older than the
//!   expiry window, for both media kinds

mod sweep;

pub use sweep::spawn_sweep_task;
