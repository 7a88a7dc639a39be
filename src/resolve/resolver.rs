//! Asset Resolver
//!
//! The three-tier resolution engine: in-memory slots, persistent store,
//! remote lookup. One resolver exists per asset kind, constructed once at
//! startup and shared by reference; nothing here is a process-wide global,
//! so tests build throwaway instances freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::FutureExt;
use tracing::debug;

use super::lookup::AssetLookup;
use super::reference::AssetReference;
use super::share_links::rewrite_share_link;
use super::slot::{SharedResolution, Slot};
use super::stats::{ResolveStats, ResolveStatsSnapshot};
use super::ASSET_EXPIRY_MS;
use crate::error::Result;
use crate::store::{AssetEntry, AssetKind, CacheDb};

// == Asset Resolver ==
/// Resolves asset references for one media kind.
pub struct AssetResolver {
    kind: AssetKind,
    /// In-memory tier; lives for the process lifetime, never expires.
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    db: CacheDb,
    lookup: Arc<dyn AssetLookup>,
    stats: Arc<ResolveStats>,
}

impl AssetResolver {
    // == Constructor ==
    /// Creates a resolver over the given store and remote lookup.
    pub fn new(kind: AssetKind, db: CacheDb, lookup: Arc<dyn AssetLookup>) -> Self {
        Self {
            kind,
            slots: Arc::new(Mutex::new(HashMap::new())),
            db,
            lookup,
            stats: Arc::new(ResolveStats::new()),
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Point-in-time counters for the stats endpoint.
    pub fn stats(&self) -> ResolveStatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of live in-memory slots (pending or resolved).
    pub fn memory_entries(&self) -> usize {
        lock(&self.slots).len()
    }

    // == Resolve ==
    /// Resolves a reference to a displayable URL.
    ///
    /// - Empty input resolves to None immediately, no side effects.
    /// - A reference that is already a usable URL is returned unchanged
    ///   (video sharing links are first rewritten to their direct-stream
    ///   form) with no caching and no remote call.
    /// - An opaque ID goes through the tiers: in-memory slot, persistent
    ///   store, then exactly one remote lookup shared by all concurrent
    ///   callers of the same ID.
    ///
    /// Failures never escape: a lookup or storage error settles the call to
    /// None and clears the slot so a later call retries. There is no
    /// negative caching.
    pub async fn resolve(&self, reference: &str) -> Option<String> {
        if reference.is_empty() {
            return None;
        }

        match AssetReference::classify(reference) {
            AssetReference::Url(url) => {
                if self.kind == AssetKind::Video {
                    if let Some(direct) = rewrite_share_link(&url) {
                        return Some(direct);
                    }
                }
                Some(url)
            }
            AssetReference::Id(id) => self.resolve_id(id).await,
        }
    }

    /// Invalidates a persisted mapping and drops its in-memory slot.
    ///
    /// Returns true when a persisted row existed.
    pub async fn invalidate(&self, id: &str) -> Result<bool> {
        lock(&self.slots).remove(id);
        self.db.delete_asset(self.kind, id).await
    }

    async fn resolve_id(&self, id: String) -> Option<String> {
        let shared = {
            let mut slots = lock(&self.slots);
            match slots.get(&id) {
                Some(Slot::Resolved(url)) => {
                    self.stats.record_memory_hit();
                    return Some(url.clone());
                }
                Some(Slot::Pending(pending)) => {
                    self.stats.record_memory_hit();
                    pending.clone()
                }
                None => {
                    // Insert under the same lock that missed, so a racing
                    // caller cannot start a second lookup for this ID.
                    let pending = self.spawn_resolution(id.clone());
                    slots.insert(id, Slot::Pending(pending.clone()));
                    pending
                }
            }
        };

        shared.await
    }

    /// Starts the store-then-remote resolution in a spawned task.
    ///
    /// The task owns the slot's final state: it settles to Resolved on
    /// success or clears the slot on a miss/failure, and it runs to
    /// completion even if every awaiting caller is dropped.
    fn spawn_resolution(&self, id: String) -> SharedResolution {
        let kind = self.kind;
        let slots = Arc::clone(&self.slots);
        let db = self.db.clone();
        let lookup = Arc::clone(&self.lookup);
        let stats = Arc::clone(&self.stats);

        let task = tokio::spawn(async move {
            let resolved = fetch_through_tiers(kind, &id, &db, lookup.as_ref(), &stats).await;

            let mut slots = lock(&slots);
            match &resolved {
                Some(url) => {
                    slots.insert(id, Slot::Resolved(url.clone()));
                }
                None => {
                    slots.remove(&id);
                }
            }
            resolved
        });

        async move { task.await.ok().flatten() }.boxed().shared()
    }
}

/// Persistent-store tier, then the remote tier.
async fn fetch_through_tiers(
    kind: AssetKind,
    id: &str,
    db: &CacheDb,
    lookup: &dyn AssetLookup,
    stats: &ResolveStats,
) -> Option<String> {
    let now = Utc::now().timestamp_millis();

    match db.get_asset(kind, id).await {
        Ok(Some(entry)) if now - entry.stored_at < ASSET_EXPIRY_MS => {
            stats.record_store_hit();
            return Some(entry.url);
        }
        Ok(Some(_)) => {
            // Aged out: the miss deletes the entry as a side effect.
            if let Err(err) = db.delete_asset(kind, id).await {
                debug!(kind = kind.as_str(), id, %err, "failed to drop expired entry");
            }
        }
        Ok(None) => {}
        Err(err) => {
            debug!(kind = kind.as_str(), id, %err, "store read failed, treating as miss");
        }
    }

    stats.record_remote_fetch();
    match lookup.fetch_asset_by_id(id).await {
        Ok(Some(record)) if !record.url.is_empty() => {
            let entry = AssetEntry {
                id: id.to_string(),
                url: record.url.clone(),
                stored_at: now,
            };
            if let Err(err) = db.put_asset(kind, &entry).await {
                debug!(kind = kind.as_str(), id, %err, "failed to persist resolved URL");
            }
            Some(record.url)
        }
        Ok(_) => {
            stats.record_miss();
            None
        }
        Err(err) => {
            stats.record_miss();
            debug!(kind = kind.as_str(), id, %err, "asset lookup failed");
            None
        }
    }
}

fn lock(slots: &Mutex<HashMap<String, Slot>>) -> MutexGuard<'_, HashMap<String, Slot>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::resolve::lookup::AssetRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    /// Lookup double with a fixed answer, optional latency, and a call count.
    struct ScriptedLookup {
        url: Option<String>,
        fail: bool,
        delay: Duration,
        calls: AtomicU64,
    }

    impl ScriptedLookup {
        fn found(url: &str) -> Self {
            Self {
                url: Some(url.to_string()),
                fail: false,
                delay: Duration::ZERO,
                calls: AtomicU64::new(0),
            }
        }

        fn not_found() -> Self {
            Self {
                url: None,
                fail: false,
                delay: Duration::ZERO,
                calls: AtomicU64::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                url: None,
                fail: true,
                delay: Duration::ZERO,
                calls: AtomicU64::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssetLookup for ScriptedLookup {
        async fn fetch_asset_by_id(&self, _id: &str) -> Result<Option<AssetRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(GatewayError::Internal("lookup offline".to_string()));
            }
            Ok(self.url.clone().map(|url| AssetRecord { url }))
        }
    }

    async fn resolver_with(
        kind: AssetKind,
        lookup: Arc<ScriptedLookup>,
    ) -> (AssetResolver, CacheDb) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let resolver = AssetResolver::new(kind, db.clone(), lookup);
        (resolver, db)
    }

    #[tokio::test]
    async fn test_empty_reference_resolves_none() {
        let lookup = Arc::new(ScriptedLookup::found("https://cdn/x.jpg"));
        let (resolver, db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        assert_eq!(resolver.resolve("").await, None);
        assert_eq!(lookup.calls(), 0);
        assert_eq!(db.count_assets(AssetKind::Image).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_usable_url_returned_unchanged_without_side_effects() {
        let lookup = Arc::new(ScriptedLookup::found("https://cdn/x.jpg"));
        let (resolver, db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        let url = resolver.resolve("https://site.example/hero.png").await;

        assert_eq!(url.as_deref(), Some("https://site.example/hero.png"));
        assert_eq!(lookup.calls(), 0);
        assert_eq!(resolver.memory_entries(), 0);
        assert_eq!(db.count_assets(AssetKind::Image).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_video_share_link_rewritten_to_direct_stream() {
        let lookup = Arc::new(ScriptedLookup::not_found());
        let (resolver, _db) = resolver_with(AssetKind::Video, Arc::clone(&lookup)).await;

        let url = resolver
            .resolve("https://drive.example.com/file/d/FILEID123/view")
            .await
            .unwrap();

        assert_eq!(
            url,
            "https://drive.example.com/uc?export=download&id=FILEID123"
        );
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_image_resolver_leaves_share_links_alone() {
        let lookup = Arc::new(ScriptedLookup::not_found());
        let (resolver, _db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        let link = "https://drive.example.com/file/d/FILEID123/view";
        assert_eq!(resolver.resolve(link).await.as_deref(), Some(link));
    }

    #[tokio::test]
    async fn test_opaque_id_resolves_and_persists() {
        let lookup = Arc::new(ScriptedLookup::found("https://cdn/abc.jpg"));
        let (resolver, db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        let url = resolver.resolve("abc123").await;

        assert_eq!(url.as_deref(), Some("https://cdn/abc.jpg"));
        assert_eq!(lookup.calls(), 1);
        let persisted = db.get_asset(AssetKind::Image, "abc123").await.unwrap();
        assert_eq!(persisted.unwrap().url, "https://cdn/abc.jpg");
    }

    #[tokio::test]
    async fn test_repeat_resolution_uses_memory_tier() {
        let lookup = Arc::new(ScriptedLookup::found("https://cdn/abc.jpg"));
        let (resolver, _db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        resolver.resolve("abc123").await.unwrap();
        resolver.resolve("abc123").await.unwrap();
        resolver.resolve("abc123").await.unwrap();

        assert_eq!(lookup.calls(), 1);
        assert_eq!(resolver.stats().memory_hits, 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_lookup() {
        let lookup = Arc::new(
            ScriptedLookup::found("https://cdn/abc.jpg").with_delay(Duration::from_millis(50)),
        );
        let (resolver, _db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        let (a, b, c) = tokio::join!(
            resolver.resolve("abc123"),
            resolver.resolve("abc123"),
            resolver.resolve("abc123"),
        );

        assert_eq!(a.as_deref(), Some("https://cdn/abc.jpg"));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_ids_resolve_independently() {
        let lookup = Arc::new(ScriptedLookup::found("https://cdn/x.jpg"));
        let (resolver, _db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        let (a, b) = tokio::join!(resolver.resolve("one"), resolver.resolve("two"));

        assert!(a.is_some());
        assert!(b.is_some());
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn test_store_tier_skips_remote_lookup() {
        let lookup = Arc::new(ScriptedLookup::failing());
        let (resolver, db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        let now = Utc::now().timestamp_millis();
        db.put_asset(
            AssetKind::Image,
            &AssetEntry {
                id: "warm".to_string(),
                url: "https://cdn/warm.jpg".to_string(),
                // Well inside the window
                stored_at: now - ASSET_EXPIRY_MS + 60_000,
            },
        )
        .await
        .unwrap();

        let url = resolver.resolve("warm").await;

        assert_eq!(url.as_deref(), Some("https://cdn/warm.jpg"));
        assert_eq!(lookup.calls(), 0);
        assert_eq!(resolver.stats().store_hits, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_gets_deleted() {
        let lookup = Arc::new(ScriptedLookup::not_found());
        let (resolver, db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        let now = Utc::now().timestamp_millis();
        db.put_asset(
            AssetKind::Image,
            &AssetEntry {
                id: "stale".to_string(),
                url: "https://cdn/stale.jpg".to_string(),
                stored_at: now - ASSET_EXPIRY_MS - 1,
            },
        )
        .await
        .unwrap();

        let url = resolver.resolve("stale").await;

        assert_eq!(url, None);
        assert_eq!(lookup.calls(), 1);
        // Lazy expiry removed the aged row.
        assert!(db.get_asset(AssetKind::Image, "stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_negatively_cached() {
        let lookup = Arc::new(ScriptedLookup::not_found());
        let (resolver, _db) = resolver_with(AssetKind::Image, Arc::clone(&lookup)).await;

        assert_eq!(resolver.resolve("ghost").await, None);
        assert_eq!(resolver.resolve("ghost").await, None);

        // Each call issued a fresh remote lookup.
        assert_eq!(lookup.calls(), 2);
        assert_eq!(resolver.memory_entries(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_settles_to_none_and_allows_retry() {
        let lookup = Arc::new(ScriptedLookup::failing());
        let (resolver, _db) = resolver_with(AssetKind::Video, Arc::clone(&lookup)).await;

        assert_eq!(resolver.resolve("vid9").await, None);
        assert_eq!(resolver.memory_entries(), 0);

        assert_eq!(resolver.resolve("vid9").await, None);
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_drops_both_tiers() {
        let lookup = Arc::new(ScriptedLookup::found("https://cdn/v.mp4"));
        let (resolver, db) = resolver_with(AssetKind::Video, Arc::clone(&lookup)).await;

        resolver.resolve("vid1").await.unwrap();
        assert_eq!(resolver.memory_entries(), 1);

        assert!(resolver.invalidate("vid1").await.unwrap());
        assert_eq!(resolver.memory_entries(), 0);
        assert!(db.get_asset(AssetKind::Video, "vid1").await.unwrap().is_none());

        // A later resolve starts from scratch.
        resolver.resolve("vid1").await.unwrap();
        assert_eq!(lookup.calls(), 2);
    }
}
