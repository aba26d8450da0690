//! Shared fixtures for the orchestrator integration tests
//!
//! - `Harness`: orchestrator wired to a simulated backend (clockless unless
//!   built with `ticking`) and an in-memory progress store
//! - `RecordingObserver` / `RecordingNavigator`: capture callbacks
//! - request builders for the common content kinds

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use playback_hub::controller::{PipNavigator, PipOrigin, PlaybackObserver};
use playback_hub::model::MemoryProgressStore;
use playback_hub::{ContentType, OrchestratorConfig, PlaybackOrchestrator, SimulatedBackend, SwitchRequest};

pub const CLIP_LENGTH: Duration = Duration::from_secs(10);

pub struct Harness {
    pub backend: SimulatedBackend,
    pub progress: MemoryProgressStore,
    pub orchestrator: PlaybackOrchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(OrchestratorConfig::default())
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self::with_backend(SimulatedBackend::new(), config)
    }

    /// Backend whose playhead advances by itself every `tick`.
    pub fn ticking(tick: Duration) -> Self {
        Self::with_backend(SimulatedBackend::with_ticks(tick), OrchestratorConfig::default())
    }

    fn with_backend(backend: SimulatedBackend, config: OrchestratorConfig) -> Self {
        let progress = MemoryProgressStore::new();
        let orchestrator = PlaybackOrchestrator::new(Arc::new(backend.clone()), Arc::new(progress.clone()), config);
        Self {
            backend,
            progress,
            orchestrator,
        }
    }

    /// Register `url` with a load latency and the standard clip length.
    pub async fn media(&self, url: &str, latency_ms: u64) {
        self.backend
            .set_media(url, Duration::from_millis(latency_ms), CLIP_LENGTH)
            .await;
    }
}

pub fn short(id: &str) -> SwitchRequest {
    SwitchRequest::new(ContentType::ShortsFlow, id, url_for(id))
}

pub fn detail(id: &str) -> SwitchRequest {
    SwitchRequest::new(ContentType::Shorts, id, url_for(id))
}

pub fn episode(series: &str, index: usize) -> SwitchRequest {
    SwitchRequest::new(ContentType::LongForm, series, format!("EP{index}${}", episode_url(series, index))).episode(index)
}

pub fn url_for(id: &str) -> String {
    format!("https://cdn.test/{id}.m3u8")
}

pub fn episode_url(series: &str, index: usize) -> String {
    format!("https://cdn.test/{series}/{index}.m3u8")
}

/// Let spawned tasks (event pump, surface switches) drain their queues.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[derive(Default)]
pub struct RecordingObserver {
    progress: Mutex<Vec<Duration>>,
    guidance: Mutex<Vec<(String, f64)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn progress(&self) -> Vec<Duration> {
        self.progress.lock().unwrap().clone()
    }

    pub fn guidance(&self) -> Vec<(String, f64)> {
        self.guidance.lock().unwrap().clone()
    }
}

impl PlaybackObserver for RecordingObserver {
    fn on_progress(&self, position: Duration, _duration: Duration) {
        self.progress.lock().unwrap().push(position);
    }

    fn on_guidance(&self, content_id: &str, fraction: f64) {
        self.guidance.lock().unwrap().push((content_id.to_string(), fraction));
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<PipOrigin>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<PipOrigin> {
        self.visits.lock().unwrap().clone()
    }
}

impl PipNavigator for RecordingNavigator {
    fn return_to(&self, origin: &PipOrigin) {
        self.visits.lock().unwrap().push(origin.clone());
    }
}
