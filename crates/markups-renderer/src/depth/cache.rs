//! Per-target depth buffer cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::DepthSnapshot;
use crate::notify::{RenderEvent, RenderNotifier, SubscriptionId};
use crate::target::RenderTargetId;

struct CacheEntry {
    snapshot: Arc<DepthSnapshot>,
    stale: bool,
}

/// Most recently captured depth snapshot per render target.
///
/// At most one snapshot is kept per target. A snapshot is marked stale when
/// the target reports a completed render and is not returned again until a
/// new one is stored.
#[derive(Default)]
pub struct DepthBufferCache {
    entries: HashMap<RenderTargetId, CacheEntry>,
}

impl DepthBufferCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot of a target, or `None` if it is absent
    /// or stale.
    pub fn get(&self, target: RenderTargetId) -> Option<Arc<DepthSnapshot>> {
        self.entries
            .get(&target)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.snapshot.clone())
    }

    /// Stores a fresh snapshot, replacing any previous one.
    pub fn store(&mut self, target: RenderTargetId, snapshot: DepthSnapshot) -> Arc<DepthSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.entries.insert(
            target,
            CacheEntry {
                snapshot: snapshot.clone(),
                stale: false,
            },
        );
        tracing::debug!(
            "Stored depth snapshot for {} ({}x{})",
            target,
            snapshot.buffer.width(),
            snapshot.buffer.height()
        );
        snapshot
    }

    /// Marks the snapshot of a target stale. Idempotent.
    pub fn invalidate(&mut self, target: RenderTargetId) {
        if let Some(entry) = self.entries.get_mut(&target)
            && !entry.stale
        {
            entry.stale = true;
            tracing::trace!("Invalidated depth snapshot for {}", target);
        }
    }

    /// Drops everything cached for a target.
    pub fn remove(&mut self, target: RenderTargetId) -> bool {
        self.entries.remove(&target).is_some()
    }

    /// Returns true if a snapshot exists for the target but must not be used.
    pub fn is_stale(&self, target: RenderTargetId) -> bool {
        self.entries.get(&target).is_some_and(|entry| entry.stale)
    }

    /// Applies a render event.
    pub fn handle_event(&mut self, event: &RenderEvent) {
        match *event {
            RenderEvent::RenderCompleted(target) => self.invalidate(target),
            RenderEvent::TargetDestroyed(target) => {
                if self.remove(target) {
                    tracing::debug!("Removed depth snapshot of destroyed target {}", target);
                }
            }
        }
    }

    /// Number of targets with an entry (stale or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Depth buffer cache shared by every representation of one engine context.
///
/// Created together with the engine context and injected into each
/// representation. Lock sections only cover the snapshot swap.
#[derive(Clone, Default)]
pub struct SharedDepthBufferCache(Arc<Mutex<DepthBufferCache>>);

impl SharedDepthBufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes the cache to the engine's render events.
    pub fn attach(&self, notifier: &mut RenderNotifier) -> SubscriptionId {
        let cache = self.0.clone();
        notifier.subscribe(move |event| cache.lock().handle_event(event))
    }

    pub fn get(&self, target: RenderTargetId) -> Option<Arc<DepthSnapshot>> {
        self.0.lock().get(target)
    }

    pub fn store(&self, target: RenderTargetId, snapshot: DepthSnapshot) -> Arc<DepthSnapshot> {
        self.0.lock().store(target, snapshot)
    }

    pub fn invalidate(&self, target: RenderTargetId) {
        self.0.lock().invalidate(target);
    }

    pub fn remove(&self, target: RenderTargetId) -> bool {
        self.0.lock().remove(target)
    }

    pub fn is_stale(&self, target: RenderTargetId) -> bool {
        self.0.lock().is_stale(target)
    }

    /// Returns the current snapshot, capturing and storing a new one if the
    /// cached one is absent or stale. `capture` runs outside the lock.
    pub fn get_or_capture(
        &self,
        target: RenderTargetId,
        capture: impl FnOnce() -> Option<DepthSnapshot>,
    ) -> Option<Arc<DepthSnapshot>> {
        if let Some(snapshot) = self.get(target) {
            return Some(snapshot);
        }
        let snapshot = capture()?;
        Some(self.store(target, snapshot))
    }
}

#[cfg(test)]
mod tests {
    use markups_core::CameraParams;

    use super::*;
    use crate::depth::DepthBuffer;

    fn snapshot(depth: f32) -> DepthSnapshot {
        DepthSnapshot::new(
            DepthBuffer::from_fn(2, 2, |_, _| depth),
            CameraParams::default(),
        )
    }

    #[test]
    fn test_store_and_get() {
        let mut cache = DepthBufferCache::new();
        let target = RenderTargetId::new();
        assert!(cache.get(target).is_none());

        cache.store(target, snapshot(0.5));
        let stored = cache.get(target).unwrap();
        assert_eq!(stored.buffer.depth_at(0, 0), Some(0.5));

        cache.store(target, snapshot(0.25));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(target).unwrap().buffer.depth_at(0, 0), Some(0.25));
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let mut cache = DepthBufferCache::new();
        let target = RenderTargetId::new();
        cache.store(target, snapshot(0.5));

        cache.invalidate(target);
        cache.invalidate(target);
        assert!(cache.get(target).is_none());
        assert!(cache.is_stale(target));

        // Unknown targets are ignored.
        cache.invalidate(RenderTargetId::new());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_targets_are_independent() {
        let mut cache = DepthBufferCache::new();
        let a = RenderTargetId::new();
        let b = RenderTargetId::new();
        cache.store(a, snapshot(0.1));
        cache.store(b, snapshot(0.2));
        cache.invalidate(a);
        assert!(cache.get(a).is_none());
        assert!(cache.get(b).is_some());
    }

    #[test]
    fn test_notifier_invalidates_and_removes() {
        let cache = SharedDepthBufferCache::new();
        let mut notifier = RenderNotifier::new();
        cache.attach(&mut notifier);

        let target = RenderTargetId::new();
        cache.store(target, snapshot(0.5));

        notifier.render_completed(target);
        assert!(cache.get(target).is_none());
        assert!(cache.is_stale(target));

        notifier.target_destroyed(target);
        assert!(!cache.is_stale(target));
        assert!(!cache.remove(target));
    }

    #[test]
    fn test_get_or_capture_captures_once_per_render() {
        let cache = SharedDepthBufferCache::new();
        let target = RenderTargetId::new();
        let mut captures = 0;

        for _ in 0..3 {
            cache.get_or_capture(target, || {
                captures += 1;
                Some(snapshot(0.5))
            });
        }
        assert_eq!(captures, 1);

        cache.invalidate(target);
        cache.get_or_capture(target, || {
            captures += 1;
            Some(snapshot(0.5))
        });
        assert_eq!(captures, 2);
    }

    #[test]
    fn test_failed_capture_keeps_nothing() {
        let cache = SharedDepthBufferCache::new();
        let target = RenderTargetId::new();
        assert!(cache.get_or_capture(target, || None).is_none());
        assert!(cache.get(target).is_none());
    }
}
