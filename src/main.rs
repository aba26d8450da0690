use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;

use playback_hub::controller::{Activation, PipCoordinator, PipNavigator, PipOrigin, PlaybackObserver, PlaybackSurface};
use playback_hub::model::{format_duration, JsonProgressStore, PlayerState, Size, SurfaceId, SwitchRequest};
use playback_hub::{logging, ContentType, OrchestratorConfig, PlaybackOrchestrator, SimulatedBackend};

const TICK: Duration = Duration::from_millis(250);
const VIEWPORT: Size = Size::new(390.0, 844.0);

/// Prints guidance prompts the way a feed item would show them
struct ConsoleObserver {
    label: String,
}

impl PlaybackObserver for ConsoleObserver {
    fn on_guidance(&self, content_id: &str, fraction: f64) {
        println!("  [{}] guidance: watch the full series of {} ({:.0}% played)", self.label, content_id, fraction * 100.0);
    }
}

struct ConsoleNavigator;

impl PipNavigator for ConsoleNavigator {
    fn return_to(&self, origin: &PipOrigin) {
        println!("  navigate back to {:?} {} (episode {})", origin.content_type, origin.content_id, origin.episode_index);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = match logging::init_logging(Path::new(logging::DEFAULT_LOG_DIR)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {:#}", e);
            None
        }
    };

    tracing::info!("=== playback-hub starting ===");

    let config = OrchestratorConfig::load()?;
    let progress = JsonProgressStore::open(&config.progress_file).await?;
    tracing::info!(path = %progress.path().display(), "Using progress store");
    let backend = SimulatedBackend::with_ticks(TICK);
    seed_catalogue(&backend).await;

    let orchestrator = PlaybackOrchestrator::new(Arc::new(backend.clone()), Arc::new(progress), config);

    let mut states = orchestrator.state_stream();
    let printer = tokio::spawn(async move {
        let mut last: Option<PlayerState> = None;
        while let Some(state) = states.next().await {
            if last.as_ref().is_none_or(|prev| is_visible_change(prev, &state)) {
                println!(
                    "  state: {:?} {:?} {} [{:?}] {}/{} playing={} muted={}",
                    state.status,
                    state.content_type,
                    state.content_id,
                    state.mode,
                    format_duration(state.position),
                    format_duration(state.duration),
                    state.is_playing,
                    state.is_muted,
                );
            }
            last = Some(state);
        }
    });

    let result = run_session(&orchestrator).await;

    orchestrator.shutdown().await;
    printer.abort();

    if let Err(err) = &result {
        tracing::error!(error = ?err, "Session failed");
    }
    tracing::info!("playback-hub shutting down");
    result
}

async fn seed_catalogue(backend: &SimulatedBackend) {
    for (index, latency_ms) in [(0, 150), (1, 600), (2, 90), (3, 120)] {
        backend
            .set_media(&format!("https://cdn.example/shorts/{index}.m3u8"), Duration::from_millis(latency_ms), Duration::from_secs(8))
            .await;
    }
    backend
        .set_media("https://cdn.example/series/42/1.m3u8", Duration::from_millis(200), Duration::from_secs(45 * 60))
        .await;
    backend.fail_url("https://cdn.example/series/42/2.m3u8", "decoder rejected stream").await;
}

fn is_visible_change(prev: &PlayerState, next: &PlayerState) -> bool {
    prev.status != next.status
        || prev.content_id != next.content_id
        || prev.content_type != next.content_type
        || prev.mode != next.mode
        || prev.is_playing != next.is_playing
        || prev.is_muted != next.is_muted
}

fn feed_surface(orchestrator: &PlaybackOrchestrator, index: u64) -> PlaybackSurface {
    let request = SwitchRequest::new(
        ContentType::ShortsFlow,
        format!("short-{index}"),
        format!("HD$https://cdn.example/shorts/{index}.m3u8#SD$https://backup.example/shorts/{index}.m3u8"),
    )
    .cover(format!("https://img.example/shorts/{index}.jpg"));

    let observer = Arc::new(ConsoleObserver {
        label: format!("feed {index}"),
    });
    PlaybackSurface::new(orchestrator.clone(), SurfaceId(index), request, observer, true)
}

async fn report(label: &str, activation: Activation) {
    match activation {
        Activation::Started(handle) => match handle.await {
            Ok(Ok(outcome)) => println!("  {label}: {outcome:?}"),
            Ok(Err(e)) => println!("  {label}: failed, showing cover ({e})"),
            Err(e) => println!("  {label}: task aborted ({e})"),
        },
        other => println!("  {label}: {other:?}"),
    }
}

async fn run_session(orchestrator: &PlaybackOrchestrator) -> Result<()> {
    println!("-- feed: fast scroll through three items");
    let mut feed: Vec<PlaybackSurface> = (0..4).map(|i| feed_surface(orchestrator, i)).collect();

    let first = feed[0].activate().await;
    report("feed 0", first).await;
    tokio::time::sleep(Duration::from_millis(800)).await;

    feed[0].deactivate().await;
    let skipped = feed[1].activate().await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    feed[1].deactivate().await;
    let settled = feed[2].activate().await;
    report("feed 1 (scrolled past)", skipped).await;
    report("feed 2", settled).await;

    println!("-- feed: jitter on item 2");
    feed[2].deactivate().await;
    let jitter = feed[2].activate().await;
    report("feed 2 again", jitter).await;

    println!("-- watching past the guidance threshold");
    tokio::time::sleep(Duration::from_secs(3)).await;

    println!("-- open detail view of the same short");
    let detail_request = SwitchRequest::new(ContentType::Shorts, "short-2", "https://cdn.example/shorts/2.m3u8");
    let outcome = orchestrator.switch_content(detail_request).await;
    println!("  detail: {outcome:?}");

    orchestrator.toggle_mute().await;
    orchestrator.enter_fullscreen();
    orchestrator.seek_to(Duration::from_secs(6)).await;
    orchestrator.exit_fullscreen();

    println!("-- picture-in-picture");
    let pip = PipCoordinator::new(orchestrator.clone(), Arc::new(ConsoleNavigator), VIEWPORT);
    pip.open().await;
    pip.drag_update(-260.0, -300.0).await;
    let edge = pip.drag_end().await;
    let window = pip.window().await;
    println!("  window snapped {edge:?} at ({:.0}, {:.0})", window.x, window.y);
    pip.tap().await;

    println!("-- app goes to background and back");
    orchestrator.app_backgrounded().await;
    orchestrator.app_foregrounded().await;

    println!("-- series episodes");
    let episode = SwitchRequest::new(ContentType::LongForm, "series-42", "第1集$https://cdn.example/series/42/1.m3u8").episode(1);
    println!("  episode 1: {:?}", orchestrator.switch_content(episode).await);
    tokio::time::sleep(Duration::from_secs(1)).await;

    let broken = SwitchRequest::new(ContentType::LongForm, "series-42", "第2集$https://cdn.example/series/42/2.m3u8").episode(2);
    match orchestrator.switch_content(broken).await {
        Ok(outcome) => println!("  episode 2: {outcome:?}"),
        Err(e) => println!("  episode 2: failed, showing cover ({e})"),
    }

    let missing = SwitchRequest::new(ContentType::LongForm, "series-42", "  ").episode(3);
    if let Err(e) = orchestrator.switch_content(missing).await {
        println!("  episode 3: ignored ({e})");
    }

    for surface in feed.drain(..) {
        surface.dispose().await;
    }

    let state = orchestrator.state();
    println!("-- final: {} {:?} {:?}", state.content_id, state.status, state.last_error);
    Ok(())
}
