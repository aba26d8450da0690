//! Core type definitions shared by the orchestrator and UI surfaces

use std::fmt;

/// Category of the media currently loaded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    /// Autoplaying item of the vertical short-video feed
    ShortsFlow,
    /// Detail/episode view of a short
    Shorts,
    /// Series or episode detail
    LongForm,
    #[default]
    None,
}

impl ContentType {
    /// Content types that share one underlying media family.
    ///
    /// A feed item and the detail view of the same short play the same clip,
    /// so switching between them must not reload.
    pub fn family(self) -> ContentFamily {
        match self {
            ContentType::ShortsFlow | ContentType::Shorts => ContentFamily::Short,
            ContentType::LongForm => ContentFamily::Series,
            ContentType::None => ContentFamily::Nothing,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentFamily {
    Short,
    Series,
    Nothing,
}

/// Presentation mode of the single player surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Windowed,
    Fullscreen,
    PictureInPicture,
    Hidden,
}

/// How video is fitted into its surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectMode {
    /// Fill the surface, cropping overflow
    Cover,
    /// Letterbox inside the surface
    Contain,
}

/// Per-context player configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerConfig {
    pub looping: bool,
    pub auto_play: bool,
    pub show_controls: bool,
    pub aspect: AspectMode,
}

impl PlayerConfig {
    /// The canonical configuration for a content type
    pub const fn for_content(content_type: ContentType) -> Self {
        match content_type {
            ContentType::ShortsFlow => Self {
                looping: true,
                auto_play: true,
                show_controls: false,
                aspect: AspectMode::Cover,
            },
            ContentType::Shorts => Self {
                looping: false,
                auto_play: true,
                show_controls: true,
                aspect: AspectMode::Cover,
            },
            ContentType::LongForm => Self {
                looping: false,
                auto_play: true,
                show_controls: true,
                aspect: AspectMode::Contain,
            },
            ContentType::None => Self {
                looping: false,
                auto_play: false,
                show_controls: false,
                aspect: AspectMode::Contain,
            },
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::for_content(ContentType::None)
    }
}

/// Identity of a UI surface for listener registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}
