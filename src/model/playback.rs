//! Playback state and switch requests

use std::time::Duration;

use crate::resolver;

use super::types::{ContentFamily, ContentType, PlaybackMode, PlayerConfig};

/// Lifecycle of the currently requested source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A switch is loading its source
    Loading,
    /// Source loaded; transport commands are accepted
    Ready,
    /// The last load failed; the UI keeps showing the cover image
    Failed,
}

/// Equivalence key for the same-content fast path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub family: ContentFamily,
    pub content_id: String,
    pub episode_index: usize,
}

impl ContentKey {
    pub fn new(content_type: ContentType, content_id: &str, episode_index: usize) -> Self {
        Self {
            family: content_type.family(),
            content_id: content_id.to_string(),
            episode_index,
        }
    }

    /// Key under which the last-watched position is stored.
    ///
    /// Episodes of one series share a content id, so the episode index is
    /// part of the key whenever it is set.
    pub fn progress_key(&self) -> String {
        if self.episode_index == 0 {
            self.content_id.clone()
        } else {
            format!("{}#{}", self.content_id, self.episode_index)
        }
    }
}

/// Everything a UI surface supplies when it wants the player
#[derive(Clone, Debug)]
pub struct SwitchRequest {
    pub content_type: ContentType,
    pub content_id: String,
    pub episode_index: usize,
    /// Overrides the canonical config for `content_type`
    pub config: Option<PlayerConfig>,
    /// Raw upstream play URL, resolved before loading
    pub video_url: String,
    pub cover_url: String,
    pub auto_play: bool,
}

impl SwitchRequest {
    pub fn new(content_type: ContentType, content_id: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            content_type,
            content_id: content_id.into(),
            episode_index: 0,
            config: None,
            video_url: video_url.into(),
            cover_url: String::new(),
            auto_play: PlayerConfig::for_content(content_type).auto_play,
        }
    }

    pub fn episode(mut self, index: usize) -> Self {
        self.episode_index = index;
        self
    }

    pub fn cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = cover_url.into();
        self
    }

    pub fn auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.content_type, &self.content_id, self.episode_index)
    }

    /// The URL the backend should open, `None` when nothing is playable
    pub fn playable_url(&self) -> Option<String> {
        resolver::playable_line(&self.video_url, 0)
    }

    pub fn effective_config(&self) -> PlayerConfig {
        self.config
            .unwrap_or_else(|| PlayerConfig::for_content(self.content_type))
    }
}

/// The authoritative record of the single player instance
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PlayerState {
    pub content_id: String,
    pub content_type: ContentType,
    pub episode_index: usize,
    pub video_url: String,
    pub cover_url: String,
    pub config: PlayerConfig,
    pub position: Duration,
    pub duration: Duration,
    pub is_playing: bool,
    pub is_muted: bool,
    pub mode: PlaybackMode,
    pub status: PlaybackStatus,
    pub last_error: Option<String>,
}

impl PlayerState {
    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.content_type, &self.content_id, self.episode_index)
    }

    pub fn is_ready(&self) -> bool {
        self.status == PlaybackStatus::Ready
    }

    pub fn has_content(&self) -> bool {
        self.content_type != ContentType::None && !self.content_id.is_empty()
    }

    /// Fraction of the content played, 0.0 when duration is unknown
    pub fn progress_fraction(&self) -> f64 {
        if self.duration.is_zero() {
            0.0
        } else {
            (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
        }
    }

    /// Clamp a requested position into `[0, duration]`; unbounded above while
    /// the duration is still unknown.
    pub fn clamp_position(&self, position: Duration) -> Duration {
        if self.duration.is_zero() {
            position
        } else {
            position.min(self.duration)
        }
    }

    /// Apply a backend position report.
    ///
    /// Returns `false` when the report would move playback backwards; only
    /// seeks, completion and loop restarts may do that.
    pub fn advance_position(&mut self, reported: Duration) -> bool {
        let reported = self.clamp_position(reported);
        if reported < self.position {
            return false;
        }
        self.position = reported;
        true
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
        self.position = self.clamp_position(self.position);
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}
