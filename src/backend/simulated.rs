//! Clock-driven stand-in for a real decoder
//!
//! Used by the demo binary and the tests. Loads take a configurable time,
//! can be made to fail per URL, and a load that finishes after it was
//! replaced releases its decoder instead of becoming current.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use super::{BackendEvent, MediaInfo, PlayerBackend};
use crate::error::BackendError;
use crate::model::PlayerConfig;

const EVENT_CAPACITY: usize = 256;
const DEFAULT_LATENCY: Duration = Duration::from_millis(120);
const DEFAULT_MEDIA_DURATION: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
struct MediaProfile {
    latency: Duration,
    duration: Duration,
    failure: Option<String>,
}

#[derive(Debug, Default)]
struct Playhead {
    url: Option<String>,
    position: Duration,
    duration: Duration,
    playing: bool,
    muted: bool,
    looping: bool,
}

#[derive(Debug, Default)]
struct Counters {
    loads: AtomicUsize,
    released: AtomicUsize,
    unloads: AtomicUsize,
    plays: AtomicUsize,
    seeks: AtomicUsize,
}

struct Inner {
    events: broadcast::Sender<BackendEvent>,
    ready: AtomicBool,
    load_seq: AtomicU64,
    profiles: Mutex<HashMap<String, MediaProfile>>,
    default_profile: MediaProfile,
    playhead: Mutex<Playhead>,
    counters: Counters,
    tick: Option<Duration>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct SimulatedBackend {
    inner: Arc<Inner>,
}

impl SimulatedBackend {
    /// A backend that only moves when told to (no clock ticks).
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A backend that advances the playhead every `interval` while playing.
    pub fn with_ticks(interval: Duration) -> Self {
        Self::build(Some(interval))
    }

    fn build(tick: Option<Duration>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                events,
                ready: AtomicBool::new(true),
                load_seq: AtomicU64::new(0),
                profiles: Mutex::new(HashMap::new()),
                default_profile: MediaProfile {
                    latency: DEFAULT_LATENCY,
                    duration: DEFAULT_MEDIA_DURATION,
                    failure: None,
                },
                playhead: Mutex::new(Playhead::default()),
                counters: Counters::default(),
                tick,
                ticker: Mutex::new(None),
            }),
        }
    }

    /// Configure how `url` loads.
    pub async fn set_media(&self, url: &str, latency: Duration, duration: Duration) {
        self.inner.profiles.lock().await.insert(
            url.to_string(),
            MediaProfile {
                latency,
                duration,
                failure: None,
            },
        );
    }

    /// Make every load of `url` fail with `reason`.
    pub async fn fail_url(&self, url: &str, reason: &str) {
        let mut profiles = self.inner.profiles.lock().await;
        let profile = profiles
            .entry(url.to_string())
            .or_insert_with(|| self.inner.default_profile.clone());
        profile.failure = Some(reason.to_string());
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.ready.store(ready, Ordering::SeqCst);
    }

    /// Inject an event as if the decoder produced it.
    pub fn emit(&self, event: BackendEvent) {
        let _ = self.inner.events.send(event);
    }

    pub fn load_count(&self) -> usize {
        self.inner.counters.loads.load(Ordering::SeqCst)
    }

    /// Loads that completed after being replaced and gave their decoder back
    pub fn released_count(&self) -> usize {
        self.inner.counters.released.load(Ordering::SeqCst)
    }

    pub fn unload_count(&self) -> usize {
        self.inner.counters.unloads.load(Ordering::SeqCst)
    }

    pub fn play_count(&self) -> usize {
        self.inner.counters.plays.load(Ordering::SeqCst)
    }

    pub fn seek_count(&self) -> usize {
        self.inner.counters.seeks.load(Ordering::SeqCst)
    }

    pub async fn current_url(&self) -> Option<String> {
        self.inner.playhead.lock().await.url.clone()
    }

    pub async fn position(&self) -> Duration {
        self.inner.playhead.lock().await.position
    }

    pub async fn is_playing(&self) -> bool {
        self.inner.playhead.lock().await.playing
    }

    pub async fn is_muted(&self) -> bool {
        self.inner.playhead.lock().await.muted
    }

    async fn profile_for(&self, url: &str) -> MediaProfile {
        self.inner
            .profiles
            .lock()
            .await
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.inner.default_profile.clone())
    }

    async fn ensure_ticker(&self) {
        let Some(interval) = self.inner.tick else {
            return;
        };

        let mut ticker = self.inner.ticker.lock().await;
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        *ticker = Some(tokio::spawn(run_ticker(weak, interval)));
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_ticker(inner: Weak<Inner>, interval: Duration) {
    let mut clock = tokio::time::interval(interval);
    clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        clock.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };

        let mut playhead = inner.playhead.lock().await;
        if !playhead.playing || playhead.url.is_none() {
            continue;
        }

        playhead.position += interval;
        if playhead.position >= playhead.duration {
            let _ = inner.events.send(BackendEvent::Position(playhead.duration));
            let _ = inner.events.send(BackendEvent::Completed);
            playhead.position = Duration::ZERO;
            if !playhead.looping {
                playhead.playing = false;
            }
        } else {
            let _ = inner.events.send(BackendEvent::Position(playhead.position));
        }
    }
}

#[async_trait]
impl PlayerBackend for SimulatedBackend {
    async fn load(&self, url: &str, config: &PlayerConfig) -> Result<MediaInfo, BackendError> {
        let seq = self.inner.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.counters.loads.fetch_add(1, Ordering::SeqCst);
        let profile = self.profile_for(url).await;

        tokio::time::sleep(profile.latency).await;

        if let Some(reason) = profile.failure {
            tracing::debug!(url, %reason, "Simulated load failure");
            return Err(BackendError::Load {
                url: url.to_string(),
                reason,
            });
        }

        if self.inner.load_seq.load(Ordering::SeqCst) != seq {
            // Replaced while opening; give the decoder back.
            self.inner.counters.released.fetch_add(1, Ordering::SeqCst);
            tracing::trace!(url, "Simulated load replaced before completion");
            return Ok(MediaInfo {
                duration: Some(profile.duration),
            });
        }

        {
            let mut playhead = self.inner.playhead.lock().await;
            playhead.url = Some(url.to_string());
            playhead.position = Duration::ZERO;
            playhead.duration = profile.duration;
            playhead.playing = false;
            playhead.looping = config.looping;
        }
        self.emit(BackendEvent::Duration(profile.duration));

        Ok(MediaInfo {
            duration: Some(profile.duration),
        })
    }

    async fn play(&self) -> Result<(), BackendError> {
        {
            let mut playhead = self.inner.playhead.lock().await;
            if playhead.url.is_none() {
                return Err(BackendError::NotReady);
            }
            playhead.playing = true;
        }
        self.inner.counters.plays.fetch_add(1, Ordering::SeqCst);
        self.ensure_ticker().await;
        Ok(())
    }

    async fn pause(&self) -> Result<(), BackendError> {
        let mut playhead = self.inner.playhead.lock().await;
        if playhead.url.is_none() {
            return Err(BackendError::NotReady);
        }
        playhead.playing = false;
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<(), BackendError> {
        let mut playhead = self.inner.playhead.lock().await;
        if playhead.url.is_none() {
            return Err(BackendError::NotReady);
        }
        playhead.position = position.min(playhead.duration);
        self.inner.counters.seeks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<(), BackendError> {
        self.inner.playhead.lock().await.muted = muted;
        Ok(())
    }

    async fn unload(&self) {
        self.inner.load_seq.fetch_add(1, Ordering::SeqCst);
        self.inner.counters.unloads.fetch_add(1, Ordering::SeqCst);
        let mut playhead = self.inner.playhead.lock().await;
        playhead.url = None;
        playhead.playing = false;
        playhead.position = Duration::ZERO;
    }

    fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.inner.events.subscribe()
    }
}
