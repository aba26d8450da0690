//! Player backend seam
//!
//! The backend owns decode and render. The orchestrator drives it through
//! [`PlayerBackend`] and listens to its [`BackendEvent`] stream; it never
//! touches a decoder directly.

mod simulated;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::BackendError;
use crate::model::PlayerConfig;

pub use simulated::SimulatedBackend;

/// What the backend learned while opening a source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub duration: Option<Duration>,
}

/// Asynchronous notifications from the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    Position(Duration),
    Duration(Duration),
    /// Reached the end; looping sources report this on every wrap
    Completed,
    Error(String),
}

#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Open `url`, replacing whatever the player instance held.
    async fn load(&self, url: &str, config: &PlayerConfig) -> Result<MediaInfo, BackendError>;
    async fn play(&self) -> Result<(), BackendError>;
    async fn pause(&self) -> Result<(), BackendError>;
    async fn seek(&self, position: Duration) -> Result<(), BackendError>;
    async fn set_muted(&self, muted: bool) -> Result<(), BackendError>;
    /// Release the current source and any decoder it holds
    async fn unload(&self);
    /// Whether a player instance exists and can accept commands
    fn is_ready(&self) -> bool;
    fn subscribe(&self) -> broadcast::Receiver<BackendEvent>;
}
