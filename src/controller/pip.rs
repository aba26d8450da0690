//! Picture-in-picture coordination
//!
//! Window geometry lives in [`PipWindow`] and never looks at playback; this
//! layer only maps gestures onto mode changes and navigation.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::PipSettings;
use crate::model::{ContentType, Edge, PipWindow, PlaybackMode, Size};

use super::PlaybackOrchestrator;

/// The context the floating window was opened from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipOrigin {
    pub content_type: ContentType,
    pub content_id: String,
    pub episode_index: usize,
}

/// Navigation hook used when the user taps the floating window
pub trait PipNavigator: Send + Sync {
    fn return_to(&self, origin: &PipOrigin);
}

pub struct PipCoordinator {
    orchestrator: PlaybackOrchestrator,
    navigator: Arc<dyn PipNavigator>,
    window: Mutex<PipWindow>,
    origin: Mutex<Option<PipOrigin>>,
}

impl PipCoordinator {
    pub fn new(orchestrator: PlaybackOrchestrator, navigator: Arc<dyn PipNavigator>, viewport: Size) -> Self {
        let PipSettings { width, height, margin } = orchestrator.settings().pip.clone();
        Self {
            orchestrator,
            navigator,
            window: Mutex::new(PipWindow::new(viewport, Size::new(width, height), margin)),
            origin: Mutex::new(None),
        }
    }

    /// Float the player, remembering where it came from.
    pub async fn open(&self) {
        let state = self.orchestrator.state();
        *self.origin.lock().await = Some(PipOrigin {
            content_type: state.content_type,
            content_id: state.content_id,
            episode_index: state.episode_index,
        });
        self.orchestrator.enter_pip();
    }

    pub async fn window(&self) -> PipWindow {
        *self.window.lock().await
    }

    pub async fn origin(&self) -> Option<PipOrigin> {
        self.origin.lock().await.clone()
    }

    pub async fn drag_update(&self, dx: f32, dy: f32) {
        self.window.lock().await.drag_by(dx, dy);
    }

    pub async fn drag_end(&self) -> Edge {
        let mut window = self.window.lock().await;
        let edge = window.snap_to_nearest_edge();
        tracing::debug!(?edge, x = window.x, y = window.y, "PiP window snapped");
        edge
    }

    pub async fn set_viewport(&self, viewport: Size) {
        self.window.lock().await.set_viewport(viewport);
    }

    /// Leave PiP and navigate back to where playback started.
    pub async fn tap(&self) {
        if self.orchestrator.mode() != PlaybackMode::PictureInPicture {
            return;
        }

        self.orchestrator.exit_pip();
        if let Some(origin) = self.origin.lock().await.take() {
            tracing::info!(content_id = %origin.content_id, "Returning from PiP to origin");
            self.navigator.return_to(&origin);
        }
    }

    /// Leave PiP without navigating.
    pub async fn close(&self) {
        self.orchestrator.exit_pip();
        self.origin.lock().await.take();
        tracing::debug!("PiP closed");
    }
}
