//! Error types for the playback orchestrator
//!
//! Library operations return these; application edges wrap them in `anyhow`.

use thiserror::Error;

/// Failures reported by a [`PlayerBackend`](crate::backend::PlayerBackend)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The source could not be opened or decoded
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// A transport command (play, pause, seek, mute) was rejected
    #[error("player command failed: {0}")]
    Command(String),

    /// No player instance is available yet
    #[error("player backend not ready")]
    NotReady,
}

/// Errors surfaced by [`PlaybackOrchestrator::switch_content`](crate::controller::PlaybackOrchestrator::switch_content)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The request carried no playable URL; nothing was changed
    #[error("no playable source in {raw:?}")]
    EmptySource { raw: String },

    /// The backend failed to load the resolved source
    #[error(transparent)]
    BackendLoad(#[from] BackendError),
}

/// Convenience Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
