//! Content switching
//!
//! Only the newest switch may take visible effect. Every await point is
//! followed by a freshness check, and the final commit runs under the
//! operation gate so it cannot interleave with a newer token allocation.

use std::time::Duration;

use crate::error::{PlaybackError, Result};
use crate::model::{ContentType, PlaybackStatus, PlayerState, SwitchRequest};

use super::{OperationToken, PlaybackOrchestrator};

/// How a switch that did not fail ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The source was loaded and committed
    Loaded,
    /// Same content was already loaded; playback continued without reload
    Resumed,
    /// A newer switch or a cancellation overtook this one; nothing applied
    Superseded,
}

impl PlaybackOrchestrator {
    /// Make `request` the content of the single player.
    ///
    /// Returns [`PlaybackError::EmptySource`] without touching anything when
    /// the request carries no playable URL.
    pub async fn switch_content(&self, request: SwitchRequest) -> Result<SwitchOutcome> {
        if !self.can_resume(&request) && request.playable_url().is_none() {
            tracing::debug!(content_id = %request.content_id, "Switch ignored: no playable source");
            return Err(PlaybackError::EmptySource {
                raw: request.video_url,
            });
        }

        let token = self.begin_operation().await;
        self.switch_content_with(token, request).await
    }

    /// Run a switch under a token obtained from [`begin_operation`](Self::begin_operation).
    pub async fn switch_content_with(&self, token: OperationToken, request: SwitchRequest) -> Result<SwitchOutcome> {
        tracing::info!(
            token = token.0,
            content_type = ?request.content_type,
            content_id = %request.content_id,
            episode = request.episode_index,
            auto_play = request.auto_play,
            "Switching content"
        );

        if self.can_resume(&request) {
            return Ok(self.resume_same_content(token, &request).await);
        }

        let Some(url) = request.playable_url() else {
            tracing::debug!(content_id = %request.content_id, "Switch ignored: no playable source");
            return Err(PlaybackError::EmptySource {
                raw: request.video_url,
            });
        };

        if !self.tear_down_previous(token).await {
            return Ok(self.discard(token, &request).await);
        }

        let config = request.effective_config();
        let loaded = self.backend.load(&url, &config).await;

        if !self.is_current(token) {
            return Ok(self.discard(token, &request).await);
        }

        let media = match loaded {
            Ok(media) => media,
            Err(e) => return self.record_load_failure(token, &request, &url, e).await,
        };

        let duration = media.duration.unwrap_or_default();
        let resume_at = self.resume_point(&request.key().progress_key(), duration).await;

        let Some(_commit) = self.gate.commit(token).await else {
            return Ok(self.discard(token, &request).await);
        };

        if let Some(position) = resume_at {
            if let Err(e) = self.backend.seek(position).await {
                tracing::warn!(content_id = %request.content_id, error = %e, "Seek to saved progress failed");
            }
        }

        let muted = self.state.borrow().is_muted;
        if let Err(e) = self.backend.set_muted(muted).await {
            tracing::warn!(error = %e, "Failed to apply mute flag to new source");
        }

        let gate = &self.gate;
        self.state.send_modify(|state| {
            state.content_id = request.content_id.clone();
            state.content_type = request.content_type;
            state.episode_index = request.episode_index;
            state.video_url = url.clone();
            state.cover_url = request.cover_url.clone();
            state.config = config;
            state.position = resume_at.unwrap_or_default();
            state.duration = duration;
            state.is_playing = false;
            state.status = PlaybackStatus::Ready;
            state.last_error = None;
            gate.mark_committed(token);
        });

        self.guidance.lock().await.reset(request.key());
        self.start_event_pump(token).await;

        if request.auto_play {
            self.start_playback().await;
        }

        tracing::info!(
            token = token.0,
            content_id = %request.content_id,
            resumed_from_ms = resume_at.map(|p| p.as_millis() as u64),
            "Content loaded"
        );
        Ok(SwitchOutcome::Loaded)
    }

    /// Same content, already loaded on a live backend
    fn can_resume(&self, request: &SwitchRequest) -> bool {
        let state = self.state.borrow();
        state.is_ready()
            && state.content_type != ContentType::None
            && state.key() == request.key()
            && self.backend.is_ready()
    }

    async fn resume_same_content(&self, token: OperationToken, request: &SwitchRequest) -> SwitchOutcome {
        let Some(_commit) = self.gate.commit(token).await else {
            return self.discard(token, request).await;
        };

        let gate = &self.gate;
        self.state.send_modify(|state| {
            state.content_type = request.content_type;
            state.config = request.effective_config();
            if !request.cover_url.is_empty() {
                state.cover_url = request.cover_url.clone();
            }
            gate.mark_committed(token);
        });

        self.guidance.lock().await.reset(request.key());
        self.start_event_pump(token).await;

        if request.auto_play && !self.state.borrow().is_playing {
            self.start_playback().await;
        }

        tracing::debug!(token = token.0, content_id = %request.content_id, "Same content, resumed without reload");
        SwitchOutcome::Resumed
    }

    /// Save the outgoing position, detach from its events and free the decoder.
    async fn tear_down_previous(&self, token: OperationToken) -> bool {
        let Some(_commit) = self.gate.commit(token).await else {
            return false;
        };

        self.persist_position().await;
        self.stop_event_pump().await;

        let gate = &self.gate;
        self.state.send_modify(|state| {
            state.is_playing = false;
            state.status = PlaybackStatus::Loading;
            gate.clear_committed();
        });

        self.backend.unload().await;
        true
    }

    async fn record_load_failure(
        &self,
        token: OperationToken,
        request: &SwitchRequest,
        url: &str,
        error: crate::error::BackendError,
    ) -> Result<SwitchOutcome> {
        let Some(_commit) = self.gate.commit(token).await else {
            return Ok(self.discard(token, request).await);
        };

        tracing::error!(content_id = %request.content_id, url, error = %error, "Backend failed to load source");

        self.state.send_modify(|state| {
            state.content_id = request.content_id.clone();
            state.content_type = request.content_type;
            state.episode_index = request.episode_index;
            state.video_url = url.to_string();
            state.cover_url = request.cover_url.clone();
            state.config = request.effective_config();
            state.position = Duration::ZERO;
            state.duration = Duration::ZERO;
            state.is_playing = false;
            state.status = PlaybackStatus::Failed;
            state.last_error = Some(error.to_string());
        });

        Err(PlaybackError::BackendLoad(error))
    }

    /// Saved progress worth seeking to; positions at or past the end restart.
    async fn resume_point(&self, progress_key: &str, duration: Duration) -> Option<Duration> {
        let saved = self.progress.saved_position(progress_key).await?;
        if saved.is_zero() || (!duration.is_zero() && saved >= duration) {
            None
        } else {
            Some(saved)
        }
    }

    /// Drop a superseded result.
    ///
    /// When the switch was cancelled after releasing the previous content and
    /// no newer switch took over, nothing owns the player: unload whatever
    /// the cancelled load opened and publish an idle state.
    async fn discard(&self, token: OperationToken, request: &SwitchRequest) -> SwitchOutcome {
        tracing::debug!(token = token.0, content_id = %request.content_id, "Switch superseded, result discarded");

        let Some(_commit) = self.gate.commit_cancellation().await else {
            return SwitchOutcome::Superseded;
        };

        // Idle: an earlier cancelled switch already reset the state, but this
        // load may have finished after its unload.
        let released = matches!(self.state.borrow().status, PlaybackStatus::Loading | PlaybackStatus::Idle);
        if released {
            self.backend.unload().await;
            self.state.send_modify(|state| {
                *state = PlayerState {
                    mode: state.mode,
                    is_muted: state.is_muted,
                    ..PlayerState::default()
                };
            });
            tracing::info!(token = token.0, content_id = %request.content_id, "Cancelled switch released the player");
        }
        SwitchOutcome::Superseded
    }
}
