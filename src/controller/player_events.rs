//! Backend event pump
//!
//! One task per committed content. It is bound to the token that loaded the
//! content and drops every event once that token is no longer committed.
//! A reposition (seek, replay) restarts the task under a new seek generation
//! so reports queued before it cannot drag the position back.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::backend::BackendEvent;
use crate::model::PlaybackStatus;

use super::{OperationToken, PlaybackOrchestrator};

pub(crate) struct EventPump {
    token: OperationToken,
    seek_generation: u64,
    handle: JoinHandle<()>,
}

/// What an applied position report means for observers
struct PositionUpdate {
    content_id: String,
    progress_key: String,
    position: Duration,
    duration: Duration,
    fraction: f64,
}

impl PlaybackOrchestrator {
    pub(crate) async fn start_event_pump(&self, token: OperationToken) {
        let mut pump = self.event_pump.lock().await;
        let seek_generation = self.seeks.load(Ordering::SeqCst);
        if pump.as_ref().is_some_and(|p| {
            p.token == token && p.seek_generation == seek_generation && !p.handle.is_finished()
        }) {
            return;
        }
        if let Some(previous) = pump.take() {
            previous.handle.abort();
        }

        let events = self.backend.subscribe();
        let orchestrator = self.clone();
        tracing::debug!(token = token.0, seek_generation, "Starting backend event pump");

        let handle = tokio::spawn(async move {
            orchestrator.run_event_pump(token, seek_generation, events).await;
        });
        *pump = Some(EventPump {
            token,
            seek_generation,
            handle,
        });
    }

    /// Resubscribe the running pump under the current seek generation.
    pub(crate) async fn restart_event_pump(&self) {
        let token = self.event_pump.lock().await.as_ref().map(|p| p.token);
        if let Some(token) = token {
            self.start_event_pump(token).await;
        }
    }

    /// Whether a pump bound to `token` and `seek_generation` may still apply events
    fn is_live(&self, token: OperationToken, seek_generation: u64) -> bool {
        self.gate.is_committed(token) && self.seeks.load(Ordering::SeqCst) == seek_generation
    }

    pub(crate) async fn stop_event_pump(&self) {
        if let Some(pump) = self.event_pump.lock().await.take() {
            tracing::debug!(token = pump.token.0, "Stopping backend event pump");
            pump.handle.abort();
        }
    }

    async fn run_event_pump(
        &self,
        token: OperationToken,
        seek_generation: u64,
        mut events: broadcast::Receiver<BackendEvent>,
    ) {
        let mut last_saved = Duration::ZERO;

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event pump lagged behind backend");
                    continue;
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(token = token.0, "Backend event stream closed");
                    break;
                }
            };

            if !self.is_live(token, seek_generation) {
                tracing::trace!(token = token.0, ?event, "Dropping stale event");
                continue;
            }

            match event {
                BackendEvent::Position(position) => {
                    tracing::trace!(position_ms = position.as_millis() as u64, "BackendEvent::Position");
                    if let Some(update) = self.apply_position(token, seek_generation, position) {
                        self.notify_position(&update).await;
                        if update.position < last_saved {
                            last_saved = update.position;
                        }
                        if update.position - last_saved >= self.settings.progress_save_interval() {
                            self.progress.save_position(&update.progress_key, update.position).await;
                            last_saved = update.position;
                        }
                    }
                }
                BackendEvent::Duration(duration) => {
                    tracing::debug!(duration_ms = duration.as_millis() as u64, "BackendEvent::Duration");
                    self.state.send_if_modified(|state| {
                        if !self.is_live(token, seek_generation) || state.duration == duration {
                            return false;
                        }
                        state.set_duration(duration);
                        true
                    });
                }
                BackendEvent::Completed => {
                    tracing::debug!("BackendEvent::Completed");
                    self.apply_completion(token, seek_generation).await;
                    last_saved = Duration::ZERO;
                }
                BackendEvent::Error(message) => {
                    tracing::warn!(error = %message, "BackendEvent::Error");
                    self.state.send_if_modified(|state| {
                        if !self.is_live(token, seek_generation) {
                            return false;
                        }
                        state.is_playing = false;
                        state.status = PlaybackStatus::Failed;
                        state.last_error = Some(message.clone());
                        true
                    });
                }
            }
        }
    }

    /// Advance the position if `token` still owns the content.
    fn apply_position(&self, token: OperationToken, seek_generation: u64, position: Duration) -> Option<PositionUpdate> {
        let mut update = None;
        self.state.send_if_modified(|state| {
            if !self.is_live(token, seek_generation) || !state.advance_position(position) {
                return false;
            }
            update = Some(PositionUpdate {
                content_id: state.content_id.clone(),
                progress_key: state.key().progress_key(),
                position: state.position,
                duration: state.duration,
                fraction: state.progress_fraction(),
            });
            true
        });
        update
    }

    async fn notify_position(&self, update: &PositionUpdate) {
        self.listeners
            .dispatch_progress(update.position, update.duration)
            .await;

        let threshold = self.settings.guidance_fraction;
        let fire = self.guidance.lock().await.should_fire(update.fraction, threshold);
        if fire {
            tracing::info!(content_id = %update.content_id, fraction = update.fraction, "Guidance threshold reached");
            self.listeners
                .dispatch_guidance(&update.content_id, update.fraction)
                .await;
        }
    }

    /// End of media: looping sources restart, others stop and forget progress.
    async fn apply_completion(&self, token: OperationToken, seek_generation: u64) {
        let mut finished = None;
        self.state.send_if_modified(|state| {
            if !self.is_live(token, seek_generation) {
                return false;
            }
            if state.config.looping {
                state.position = Duration::ZERO;
            } else {
                state.position = state.duration;
                state.is_playing = false;
                finished = Some(state.key().progress_key());
            }
            true
        });

        if let Some(key) = finished {
            tracing::info!(progress_key = %key, "Playback finished");
            self.progress.clear(&key).await;
        }
    }
}
