//! Asset Resolution Module
//!
//! Resolves opaque asset references (CMS document IDs or ready-to-use URLs)
//! to displayable URLs through three tiers: an in-memory slot map (fastest,
//! lost on restart), the persistent store (survives restarts, time-limited),
//! and a remote lookup against the CMS content API (source of truth).

mod lookup;
mod reference;
mod resolver;
mod share_links;
mod slot;
mod stats;

pub use lookup::{AssetLookup, AssetRecord, HttpAssetLookup};
pub use reference::AssetReference;
pub use resolver::AssetResolver;
pub use share_links::rewrite_share_link;
pub use slot::Slot;
pub use stats::{ResolveStats, ResolveStatsSnapshot};

// == Public Constants ==
/// Expiry window for persisted mappings, in milliseconds (7 days).
///
/// An entry older than this is treated as absent and purged lazily on the
/// next lookup; the periodic sweep deletes aged entries independently.
pub const ASSET_EXPIRY_MS: i64 = 7 * 24 * 60 * 60 * 1000;
