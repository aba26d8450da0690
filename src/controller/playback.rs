//! Playback control methods

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::log_command_result;
use crate::model::PlaybackMode;

use super::PlaybackOrchestrator;

/// What to restore when the app returns to the foreground
#[derive(Clone, Copy, Debug)]
pub(crate) struct BackgroundSnapshot {
    mode: PlaybackMode,
    was_playing: bool,
}

impl PlaybackOrchestrator {
    pub async fn play(&self) {
        if !self.state.borrow().is_ready() {
            tracing::debug!("Play ignored: no content loaded");
            return;
        }
        self.start_playback().await;
    }

    pub async fn pause(&self) {
        if !self.state.borrow().is_ready() {
            tracing::debug!("Pause ignored: no content loaded");
            return;
        }

        let result = self.backend.pause().await;
        log_command_result!("pause", result);
        self.state.send_if_modified(|state| std::mem::replace(&mut state.is_playing, false));
        self.persist_position().await;
        tracing::info!(action = "paused", "Playback toggled");
    }

    pub async fn toggle_play_pause(&self) {
        let is_playing = self.state.borrow().is_playing;
        tracing::debug!(is_playing, "Toggling playback");
        if is_playing {
            self.pause().await;
        } else {
            self.play().await;
        }
    }

    /// Backend play without the loaded-content check; callers hold that invariant.
    ///
    /// Content that finished playing starts over from the beginning.
    pub(crate) async fn start_playback(&self) {
        let finished = {
            let state = self.state.borrow();
            !state.duration.is_zero() && state.position >= state.duration
        };
        if finished {
            tracing::debug!("Replaying finished content from the start");
            self.reposition(Duration::ZERO).await;
        }

        match self.backend.play().await {
            Ok(()) => {
                self.state.send_if_modified(|state| !std::mem::replace(&mut state.is_playing, true));
                tracing::info!(action = "resumed", "Playback toggled");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backend play failed");
                self.state.send_if_modified(|state| std::mem::replace(&mut state.is_playing, false));
            }
        }
    }

    /// Jump to `position`, clamped into the content's duration.
    ///
    /// The state moves immediately so scrubbing does not wait for the next
    /// backend position report.
    pub async fn seek_to(&self, position: Duration) {
        let target = {
            let state = self.state.borrow();
            if !state.is_ready() {
                tracing::debug!("Seek ignored: no content loaded");
                return;
            }
            state.clamp_position(position)
        };

        tracing::debug!(position_ms = target.as_millis() as u64, "Seeking");
        self.reposition(target).await;
    }

    /// Move playback to `target` and start listening afresh.
    ///
    /// Position reports queued before the move belong to the old seek
    /// generation and are dropped.
    async fn reposition(&self, target: Duration) {
        self.seeks.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| state.position = target);

        let result = self.backend.seek(target).await;
        log_command_result!("seek", result);

        self.restart_event_pump().await;
    }

    pub async fn toggle_mute(&self) {
        let mut muted = false;
        self.state.send_modify(|state| {
            state.is_muted = !state.is_muted;
            muted = state.is_muted;
        });
        tracing::debug!(muted, "Mute toggled");

        if self.backend.is_ready() {
            let result = self.backend.set_muted(muted).await;
            log_command_result!("set_muted", result);
        }
    }

    // ========================================================================
    // Presentation modes
    // ========================================================================

    pub fn enter_fullscreen(&self) {
        self.enter_mode(PlaybackMode::Fullscreen);
    }

    pub fn exit_fullscreen(&self) {
        self.leave_mode(PlaybackMode::Fullscreen);
    }

    pub fn enter_pip(&self) {
        self.enter_mode(PlaybackMode::PictureInPicture);
    }

    pub fn exit_pip(&self) {
        self.leave_mode(PlaybackMode::PictureInPicture);
    }

    pub fn enter_hidden(&self) {
        self.enter_mode(PlaybackMode::Hidden);
    }

    pub fn mode(&self) -> PlaybackMode {
        self.state.borrow().mode
    }

    /// Any other non-windowed mode is left first; there is no direct
    /// fullscreen to picture-in-picture hop.
    fn enter_mode(&self, target: PlaybackMode) {
        self.state.send_if_modified(|state| {
            if state.mode == target {
                return false;
            }
            if state.mode != PlaybackMode::Windowed {
                tracing::debug!(from = ?state.mode, "Leaving mode via windowed");
            }
            state.mode = target;
            tracing::info!(mode = ?target, "Presentation mode changed");
            true
        });
    }

    fn leave_mode(&self, current: PlaybackMode) {
        self.state.send_if_modified(|state| {
            if state.mode != current {
                return false;
            }
            state.mode = PlaybackMode::Windowed;
            tracing::info!(from = ?current, "Presentation mode changed to windowed");
            true
        });
    }

    // ========================================================================
    // App lifecycle
    // ========================================================================

    /// Hide the player and pause, remembering how to come back.
    pub async fn app_backgrounded(&self) {
        let snapshot = {
            let state = self.state.borrow();
            BackgroundSnapshot {
                mode: state.mode,
                was_playing: state.is_playing,
            }
        };

        {
            let mut background = self.background.lock().await;
            if background.is_some() {
                return;
            }
            *background = Some(snapshot);
        }

        tracing::info!(?snapshot, "App backgrounded");
        self.enter_hidden();
        if snapshot.was_playing {
            self.pause().await;
        }
    }

    pub async fn app_foregrounded(&self) {
        let Some(snapshot) = self.background.lock().await.take() else {
            return;
        };

        tracing::info!(?snapshot, "App foregrounded");
        self.state.send_if_modified(|state| {
            if state.mode != PlaybackMode::Hidden {
                return false;
            }
            state.mode = snapshot.mode;
            true
        });

        if snapshot.was_playing {
            self.play().await;
        }
    }
}
