//! Model module - Playback state and data types
//!
//! This module contains the data structures the orchestrator publishes and
//! consumes. It is organized into submodules by responsibility:
//!
//! - `types`: content types, presentation modes, player configuration
//! - `playback`: the authoritative player state and switch requests
//! - `progress`: last-watched position persistence
//! - `pip`: floating window geometry

mod types;
mod playback;
mod progress;
mod pip;

// Re-export all public types for convenient access
pub use types::{
    AspectMode, ContentFamily, ContentType, PlaybackMode, PlayerConfig, SurfaceId,
};

pub use playback::{
    format_duration, ContentKey, PlaybackStatus, PlayerState, SwitchRequest,
};

pub use progress::{JsonProgressStore, MemoryProgressStore, ProgressStore};

pub use pip::{Edge, PipWindow, Size};
