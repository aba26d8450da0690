//! Progress and guidance observers
//!
//! Surfaces mount and unmount in quick succession while the feed scrolls, so
//! each registry serializes add/remove behind its own lock. Duplicate adds
//! and removals of absent entries are absorbed as no-ops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::model::{ContentKey, SurfaceId};

/// Callbacks a UI surface receives while it is bound to the player
pub trait PlaybackObserver: Send + Sync {
    fn on_progress(&self, _position: Duration, _duration: Duration) {}

    /// Playback of `content_id` reached the guidance threshold
    fn on_guidance(&self, _content_id: &str, _fraction: f64) {}
}

/// Insertion-ordered observers keyed by surface
#[derive(Default)]
struct ObserverList {
    entries: Mutex<Vec<(SurfaceId, Arc<dyn PlaybackObserver>)>>,
}

impl ObserverList {
    async fn add(&self, id: SurfaceId, observer: Arc<dyn PlaybackObserver>) -> bool {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        entries.push((id, observer));
        true
    }

    async fn remove(&self, id: SurfaceId) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    /// Observers are called outside the lock so they may re-enter the registry.
    async fn snapshot(&self) -> Vec<Arc<dyn PlaybackObserver>> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect()
    }

    async fn ids(&self) -> Vec<SurfaceId> {
        self.entries.lock().await.iter().map(|(id, _)| *id).collect()
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    progress: ObserverList,
    guidance: ObserverList,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_progress(&self, id: SurfaceId, observer: Arc<dyn PlaybackObserver>) -> bool {
        let added = self.progress.add(id, observer).await;
        tracing::trace!(%id, added, "Progress listener add");
        added
    }

    pub async fn remove_progress(&self, id: SurfaceId) -> bool {
        let removed = self.progress.remove(id).await;
        tracing::trace!(%id, removed, "Progress listener remove");
        removed
    }

    pub async fn add_guidance(&self, id: SurfaceId, observer: Arc<dyn PlaybackObserver>) -> bool {
        let added = self.guidance.add(id, observer).await;
        tracing::trace!(%id, added, "Guidance listener add");
        added
    }

    pub async fn remove_guidance(&self, id: SurfaceId) -> bool {
        let removed = self.guidance.remove(id).await;
        tracing::trace!(%id, removed, "Guidance listener remove");
        removed
    }

    pub async fn progress_listeners(&self) -> Vec<SurfaceId> {
        self.progress.ids().await
    }

    pub async fn guidance_listeners(&self) -> Vec<SurfaceId> {
        self.guidance.ids().await
    }

    pub(crate) async fn dispatch_progress(&self, position: Duration, duration: Duration) {
        for observer in self.progress.snapshot().await {
            observer.on_progress(position, duration);
        }
    }

    pub(crate) async fn dispatch_guidance(&self, content_id: &str, fraction: f64) {
        for observer in self.guidance.snapshot().await {
            observer.on_guidance(content_id, fraction);
        }
    }
}

/// Remembers whether the guidance prompt already fired for this activation
#[derive(Debug, Default)]
pub(crate) struct GuidanceTracker {
    content: Option<ContentKey>,
    shown: bool,
}

impl GuidanceTracker {
    /// Arm the prompt for a fresh activation of `content`.
    pub(crate) fn reset(&mut self, content: ContentKey) {
        self.content = Some(content);
        self.shown = false;
    }

    /// `true` exactly once per activation, the first time `fraction` reaches
    /// `threshold`.
    pub(crate) fn should_fire(&mut self, fraction: f64, threshold: f64) -> bool {
        if self.shown || self.content.is_none() || fraction < threshold {
            return false;
        }
        self.shown = true;
        true
    }
}

/// A surface's own record of what it registered
///
/// Keeps add and remove calls paired even when mount/unmount callbacks
/// arrive twice.
pub struct ListenerBinding {
    id: SurfaceId,
    observer: Arc<dyn PlaybackObserver>,
    wants_guidance: bool,
    progress_bound: bool,
    guidance_bound: bool,
}

impl ListenerBinding {
    pub fn new(id: SurfaceId, observer: Arc<dyn PlaybackObserver>, wants_guidance: bool) -> Self {
        Self {
            id,
            observer,
            wants_guidance,
            progress_bound: false,
            guidance_bound: false,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn is_bound(&self) -> bool {
        self.progress_bound || self.guidance_bound
    }

    pub async fn bind(&mut self, registry: &ListenerRegistry) {
        if !self.progress_bound {
            registry.add_progress(self.id, self.observer.clone()).await;
            self.progress_bound = true;
        }
        if self.wants_guidance && !self.guidance_bound {
            registry.add_guidance(self.id, self.observer.clone()).await;
            self.guidance_bound = true;
        }
    }

    pub async fn unbind(&mut self, registry: &ListenerRegistry) {
        if self.progress_bound {
            registry.remove_progress(self.id).await;
            self.progress_bound = false;
        }
        if self.guidance_bound {
            registry.remove_guidance(self.id).await;
            self.guidance_bound = false;
        }
    }
}
