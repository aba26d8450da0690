//! UI surface glue: debounced activation and paired listener registration

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::Result;
use crate::model::{SurfaceId, SwitchRequest};

use super::listeners::{ListenerBinding, PlaybackObserver};
use super::{OperationToken, PlaybackOrchestrator, SwitchOutcome};

/// Per-surface guard against reload thrash while the feed jitters
#[derive(Debug, Clone)]
pub struct ActivationDebounce {
    window: Duration,
    last_activation: Option<Instant>,
}

impl ActivationDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_activation: None,
        }
    }

    /// `true` when this activation should switch content.
    ///
    /// Suppressed activations do not restart the window.
    pub fn should_switch(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_activation {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_activation = Some(now);
        true
    }
}

/// Result of [`PlaybackSurface::activate`]
#[derive(Debug)]
pub enum Activation {
    AlreadyActive,
    /// Re-activated inside the debounce window; no switch issued
    Suppressed,
    /// Nothing playable; the surface shows its cover
    NoSource,
    Started(JoinHandle<Result<SwitchOutcome>>),
}

/// One UI surface (feed item, detail view, fullscreen page) bound to the player
pub struct PlaybackSurface {
    orchestrator: PlaybackOrchestrator,
    request: SwitchRequest,
    binding: ListenerBinding,
    debounce: ActivationDebounce,
    active: bool,
    pending: Option<OperationToken>,
}

impl PlaybackSurface {
    pub fn new(
        orchestrator: PlaybackOrchestrator,
        id: SurfaceId,
        request: SwitchRequest,
        observer: Arc<dyn PlaybackObserver>,
        wants_guidance: bool,
    ) -> Self {
        let debounce = ActivationDebounce::new(orchestrator.settings().activation_debounce());
        Self {
            orchestrator,
            request,
            binding: ListenerBinding::new(id, observer, wants_guidance),
            debounce,
            active: false,
            pending: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.binding.id()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn request(&self) -> &SwitchRequest {
        &self.request
    }

    /// The surface became visible/focused.
    pub async fn activate(&mut self) -> Activation {
        if self.active {
            return Activation::AlreadyActive;
        }
        self.active = true;
        self.binding.bind(self.orchestrator.listeners()).await;

        if !self.debounce.should_switch(Instant::now()) {
            tracing::debug!(surface = %self.id(), content_id = %self.request.content_id, "Activation debounced");
            return Activation::Suppressed;
        }

        if self.request.playable_url().is_none() {
            tracing::debug!(surface = %self.id(), content_id = %self.request.content_id, "Surface has no playable source");
            return Activation::NoSource;
        }

        let token = self.orchestrator.begin_operation().await;
        self.pending = Some(token);

        let orchestrator = self.orchestrator.clone();
        let request = self.request.clone();
        Activation::Started(tokio::spawn(async move {
            orchestrator.switch_content_with(token, request).await
        }))
    }

    /// The surface scrolled away or lost focus.
    pub async fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.binding.unbind(self.orchestrator.listeners()).await;
    }

    /// The surface is being torn down; an in-flight switch it started is cancelled.
    pub async fn dispose(mut self) {
        self.deactivate().await;
        if let Some(token) = self.pending.take() {
            if self.orchestrator.cancel_operation(token).await {
                tracing::debug!(surface = %self.id(), "Cancelled own switch on dispose");
            }
        }
    }
}
