//! In-Memory Cache Slots
//!
//! One slot per opaque reference. A slot is either a resolution still in
//! flight or a settled URL; the tagged variant makes the de-duplication
//! contract explicit instead of inspecting map values for promise-ness.

use futures::future::{BoxFuture, Shared};

/// A resolution shared by every caller that raced on the same reference.
///
/// The underlying work runs in a spawned task, so it settles even when all
/// awaiting callers are dropped; there is no cancellation.
pub type SharedResolution = Shared<BoxFuture<'static, Option<String>>>;

// == Slot ==
/// State of one in-memory cache slot.
#[derive(Clone)]
pub enum Slot {
    /// A lookup is in flight; late callers await the same future.
    Pending(SharedResolution),
    /// The reference settled to a usable URL.
    Resolved(String),
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Pending(_) => f.write_str("Pending"),
            Slot::Resolved(url) => f.debug_tuple("Resolved").field(url).finish(),
        }
    }
}
