//! Controller module - the playback orchestrator
//!
//! [`PlaybackOrchestrator`] is the single owner of the player backend. UI
//! surfaces hold a clone of it and drive playback only through its methods;
//! everything they render comes from the published [`PlayerState`].
//! It is organized into submodules by responsibility:
//!
//! - `switch`: content switching with stale-result discard
//! - `playback`: transport, mute, presentation modes and app lifecycle
//! - `player_events`: backend event pump
//! - `listeners`: progress/guidance observer registry
//! - `pip`: picture-in-picture window coordination
//! - `surface`: per-surface activation debounce and listener binding

mod listeners;
mod pip;
mod playback;
mod player_events;
mod surface;
mod switch;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, MutexGuard, watch};
use tokio_stream::wrappers::WatchStream;

use crate::backend::PlayerBackend;
use crate::config::OrchestratorConfig;
use crate::model::{PlayerState, ProgressStore, SurfaceId};

pub use listeners::{ListenerBinding, ListenerRegistry, PlaybackObserver};
pub use pip::{PipCoordinator, PipNavigator, PipOrigin};
pub use surface::{Activation, ActivationDebounce, PlaybackSurface};
pub use switch::SwitchOutcome;

use listeners::GuidanceTracker;
use playback::BackgroundSnapshot;
use player_events::EventPump;

/// Generation marker of one `switch_content` call
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationToken(u64);

/// Generation value meaning "no committed content"
const NO_GENERATION: u64 = 0;

/// Serializes token allocation against the commit phase of a switch.
///
/// A commit holds the gate for its whole duration, so a newer switch cannot
/// allocate its token halfway through an older commit.
#[derive(Debug, Default)]
struct OperationGate {
    latest: AtomicU64,
    /// Generation whose content is loaded; backend events are tagged with it
    committed: AtomicU64,
    /// Token allocated by the most recent cancellation
    cancelled: AtomicU64,
    commit: Mutex<()>,
}

impl OperationGate {
    async fn begin(&self) -> OperationToken {
        let _gate = self.commit.lock().await;
        OperationToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Supersede every earlier token without starting new work.
    async fn cancel(&self) -> OperationToken {
        let _gate = self.commit.lock().await;
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancelled.store(token, Ordering::SeqCst);
        OperationToken(token)
    }

    /// Cancel only if `token` is still the newest one.
    async fn cancel_if_current(&self, token: OperationToken) -> bool {
        let _gate = self.commit.lock().await;
        if !self.is_current(token) {
            return false;
        }
        let next = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancelled.store(next, Ordering::SeqCst);
        true
    }

    /// Enter the commit phase on behalf of a cancellation, or `None` if a
    /// switch started after it.
    async fn commit_cancellation(&self) -> Option<MutexGuard<'_, ()>> {
        let gate = self.commit.lock().await;
        (self.latest.load(Ordering::SeqCst) == self.cancelled.load(Ordering::SeqCst)).then_some(gate)
    }

    fn is_current(&self, token: OperationToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Enter the commit phase, or `None` if `token` was superseded.
    async fn commit(&self, token: OperationToken) -> Option<MutexGuard<'_, ()>> {
        let gate = self.commit.lock().await;
        self.is_current(token).then_some(gate)
    }

    fn is_committed(&self, token: OperationToken) -> bool {
        self.committed.load(Ordering::SeqCst) == token.0
    }

    fn mark_committed(&self, token: OperationToken) {
        self.committed.store(token.0, Ordering::SeqCst);
    }

    fn clear_committed(&self) {
        self.committed.store(NO_GENERATION, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct PlaybackOrchestrator {
    pub(crate) backend: Arc<dyn PlayerBackend>,
    pub(crate) progress: Arc<dyn ProgressStore>,
    pub(crate) settings: Arc<OrchestratorConfig>,
    state: Arc<watch::Sender<PlayerState>>,
    gate: Arc<OperationGate>,
    listeners: Arc<ListenerRegistry>,
    guidance: Arc<Mutex<GuidanceTracker>>,
    /// Bumped on every reposition; queued position reports from before it are dropped
    seeks: Arc<AtomicU64>,
    event_pump: Arc<Mutex<Option<EventPump>>>,
    background: Arc<Mutex<Option<BackgroundSnapshot>>>,
}

impl PlaybackOrchestrator {
    pub fn new(
        backend: Arc<dyn PlayerBackend>,
        progress: Arc<dyn ProgressStore>,
        settings: OrchestratorConfig,
    ) -> Self {
        let (state, _) = watch::channel(PlayerState::default());
        Self {
            backend,
            progress,
            settings: Arc::new(settings),
            state: Arc::new(state),
            gate: Arc::new(OperationGate::default()),
            listeners: Arc::new(ListenerRegistry::new()),
            guidance: Arc::new(Mutex::new(GuidanceTracker::default())),
            seeks: Arc::new(AtomicU64::new(0)),
            event_pump: Arc::new(Mutex::new(None)),
            background: Arc::new(Mutex::new(None)),
        }
    }

    pub fn settings(&self) -> &OrchestratorConfig {
        &self.settings
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published state change
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state.subscribe()
    }

    pub fn state_stream(&self) -> WatchStream<PlayerState> {
        WatchStream::new(self.subscribe())
    }

    /// Allocate a new operation token, superseding every earlier one.
    pub async fn begin_operation(&self) -> OperationToken {
        self.gate.begin().await
    }

    /// Invalidate whatever switch is in flight.
    ///
    /// A switch that already released the previous content gives the player
    /// back when it returns, leaving the state idle.
    pub async fn cancel_current_operation(&self) {
        let token = self.gate.cancel().await;
        tracing::debug!(token = token.0, "Current operation cancelled");
    }

    /// Invalidate `token` if it is still the newest one; newer work is left alone.
    pub async fn cancel_operation(&self, token: OperationToken) -> bool {
        let cancelled = self.gate.cancel_if_current(token).await;
        if cancelled {
            tracing::debug!(token = token.0, "Operation cancelled by its owner");
        }
        cancelled
    }

    pub fn is_current(&self, token: OperationToken) -> bool {
        self.gate.is_current(token)
    }

    // ========================================================================
    // Listener registry
    // ========================================================================

    pub async fn add_progress_listener(&self, id: SurfaceId, observer: Arc<dyn PlaybackObserver>) -> bool {
        self.listeners.add_progress(id, observer).await
    }

    pub async fn remove_progress_listener(&self, id: SurfaceId) -> bool {
        self.listeners.remove_progress(id).await
    }

    pub async fn add_guidance_listener(&self, id: SurfaceId, observer: Arc<dyn PlaybackObserver>) -> bool {
        self.listeners.add_guidance(id, observer).await
    }

    pub async fn remove_guidance_listener(&self, id: SurfaceId) -> bool {
        self.listeners.remove_guidance(id).await
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Persist the position, stop listening to the backend and release it.
    pub async fn shutdown(&self) {
        self.gate.cancel().await;
        self.persist_position().await;
        self.stop_event_pump().await;
        self.gate.clear_committed();
        self.backend.unload().await;
        self.state.send_modify(|state| {
            state.is_playing = false;
        });
        tracing::info!("Playback orchestrator shut down");
    }

    /// Save the position of the loaded content, if any.
    pub(crate) async fn persist_position(&self) {
        let snapshot = {
            let state = self.state.borrow();
            (state.is_ready() && state.has_content()).then(|| (state.key().progress_key(), state.position))
        };

        if let Some((key, position)) = snapshot {
            tracing::debug!(progress_key = %key, position_ms = position.as_millis() as u64, "Saving playback position");
            self.progress.save_position(&key, position).await;
        }
    }
}
