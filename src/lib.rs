//! Global media-playback orchestrator
//!
//! One [`controller::PlaybackOrchestrator`] owns the device's single player
//! backend and multiplexes it across UI surfaces: the short-video feed,
//! detail views, fullscreen and the floating picture-in-picture window.

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod resolver;

pub use backend::{BackendEvent, MediaInfo, PlayerBackend, SimulatedBackend};
pub use config::OrchestratorConfig;
pub use controller::{
    Activation, OperationToken, PipCoordinator, PipNavigator, PlaybackObserver, PlaybackOrchestrator,
    PlaybackSurface, SwitchOutcome,
};
pub use error::{BackendError, PlaybackError};
pub use model::{ContentType, PlaybackMode, PlayerConfig, PlayerState, SurfaceId, SwitchRequest};
