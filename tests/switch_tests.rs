//! Content switching integration tests
//!
//! Covers the same-content fast path, stale-result discard when loads finish
//! out of order, empty sources, load failures and progress restore.

mod helpers;

use std::time::Duration;

use helpers::{detail, episode, episode_url, settle, short, url_for, Harness, CLIP_LENGTH};
use playback_hub::model::{ContentKey, PlaybackStatus, ProgressStore};
use playback_hub::{BackendError, BackendEvent, ContentType, PlaybackError, SwitchOutcome, SwitchRequest};

const MOVIE_LENGTH: Duration = Duration::from_secs(60);

async fn movie_harness() -> Harness {
    let h = Harness::new();
    for id in ["movie-1", "movie-2"] {
        h.backend
            .set_media(&url_for(id), Duration::from_millis(20), MOVIE_LENGTH)
            .await;
    }
    h
}

fn movie(id: &str) -> SwitchRequest {
    SwitchRequest::new(ContentType::LongForm, id, url_for(id))
}

#[tokio::test(start_paused = true)]
async fn switching_to_loaded_content_does_not_reload() {
    let h = Harness::new();
    h.media(&url_for("a"), 100).await;

    let first = h.orchestrator.switch_content(short("a")).await.unwrap();
    assert_eq!(first, SwitchOutcome::Loaded);
    assert!(h.orchestrator.state().is_playing);

    h.backend.emit(BackendEvent::Position(Duration::from_secs(4)));
    settle().await;
    assert_eq!(h.orchestrator.state().position, Duration::from_secs(4));

    let again = h.orchestrator.switch_content(short("a")).await.unwrap();
    assert_eq!(again, SwitchOutcome::Resumed);

    let state = h.orchestrator.state();
    assert_eq!(h.backend.load_count(), 1);
    assert_eq!(state.position, Duration::from_secs(4));
    assert!(state.is_playing);
    assert_eq!(state.status, PlaybackStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn feed_and_detail_views_share_the_loaded_short() {
    let h = Harness::new();
    h.media(&url_for("a"), 50).await;

    h.orchestrator.switch_content(short("a")).await.unwrap();
    assert!(h.orchestrator.state().config.looping);

    let outcome = h.orchestrator.switch_content(detail("a")).await.unwrap();
    assert_eq!(outcome, SwitchOutcome::Resumed);

    let state = h.orchestrator.state();
    assert_eq!(state.content_type, ContentType::Shorts);
    assert!(state.config.show_controls);
    assert!(!state.config.looping);
    assert_eq!(h.backend.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn other_episode_of_same_series_reloads() {
    let h = Harness::new();
    h.media(&episode_url("s", 1), 20).await;
    h.media(&episode_url("s", 2), 20).await;

    h.orchestrator.switch_content(episode("s", 1)).await.unwrap();
    let outcome = h.orchestrator.switch_content(episode("s", 2)).await.unwrap();

    assert_eq!(outcome, SwitchOutcome::Loaded);
    assert_eq!(h.backend.load_count(), 2);
    assert_eq!(h.orchestrator.state().episode_index, 2);
    assert_eq!(h.backend.current_url().await, Some(episode_url("s", 2)));
}

#[tokio::test(start_paused = true)]
async fn slow_older_load_is_discarded_when_newer_finishes_first() {
    let h = Harness::new();
    h.media(&url_for("a"), 500).await;
    h.media(&url_for("b"), 50).await;

    let orchestrator = h.orchestrator.clone();
    let slow = tokio::spawn(async move { orchestrator.switch_content(short("a")).await });
    tokio::time::sleep(Duration::from_millis(1)).await;

    let fast = h.orchestrator.switch_content(short("b")).await.unwrap();
    let slow = slow.await.unwrap().unwrap();

    assert_eq!(fast, SwitchOutcome::Loaded);
    assert_eq!(slow, SwitchOutcome::Superseded);

    let state = h.orchestrator.state();
    assert_eq!(state.content_id, "b");
    assert_eq!(state.video_url, url_for("b"));
    assert_eq!(h.backend.current_url().await, Some(url_for("b")));
    assert_eq!(h.backend.released_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn only_last_of_a_burst_is_applied() {
    let h = Harness::new();
    let ids = ["a", "b", "c", "d"];
    for (latency, id) in [400, 300, 200, 100].into_iter().zip(ids) {
        h.media(&url_for(id), latency).await;
    }

    let mut handles = Vec::new();
    for id in ids {
        let orchestrator = h.orchestrator.clone();
        handles.push(tokio::spawn(async move { orchestrator.switch_content(short(id)).await }));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let outcomes: Vec<SwitchOutcome> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(
        outcomes,
        vec![
            SwitchOutcome::Superseded,
            SwitchOutcome::Superseded,
            SwitchOutcome::Superseded,
            SwitchOutcome::Loaded,
        ]
    );
    assert_eq!(h.orchestrator.state().content_id, "d");
}

#[tokio::test(start_paused = true)]
async fn empty_source_leaves_state_untouched() {
    let h = Harness::new();
    h.media(&url_for("a"), 20).await;
    h.orchestrator.switch_content(short("a")).await.unwrap();
    let before = h.orchestrator.state();

    for raw in ["", "   ", "HD$"] {
        let request = SwitchRequest::new(ContentType::ShortsFlow, "x", raw);
        let err = h.orchestrator.switch_content(request).await.unwrap_err();
        assert!(matches!(err, PlaybackError::EmptySource { .. }), "{raw:?} gave {err:?}");
    }

    assert_eq!(h.orchestrator.state(), before);
    assert_eq!(h.backend.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_source_does_not_supersede_an_inflight_switch() {
    let h = Harness::new();
    h.media(&url_for("a"), 200).await;

    let orchestrator = h.orchestrator.clone();
    let pending = tokio::spawn(async move { orchestrator.switch_content(short("a")).await });
    tokio::time::sleep(Duration::from_millis(1)).await;

    let blank = SwitchRequest::new(ContentType::ShortsFlow, "x", "");
    assert!(h.orchestrator.switch_content(blank).await.is_err());

    assert_eq!(pending.await.unwrap().unwrap(), SwitchOutcome::Loaded);
    assert_eq!(h.orchestrator.state().content_id, "a");
}

#[tokio::test(start_paused = true)]
async fn load_failure_marks_content_failed() {
    let h = Harness::new();
    h.backend.fail_url(&url_for("bad"), "corrupt stream").await;
    h.media(&url_for("good"), 20).await;

    let err = h.orchestrator.switch_content(short("bad")).await.unwrap_err();
    assert!(matches!(err, PlaybackError::BackendLoad(BackendError::Load { .. })));

    let state = h.orchestrator.state();
    assert_eq!(state.status, PlaybackStatus::Failed);
    assert_eq!(state.content_id, "bad");
    assert!(!state.is_playing);
    assert!(state.last_error.as_deref().is_some_and(|e| e.contains("corrupt stream")));

    h.orchestrator.play().await;
    assert!(!h.orchestrator.state().is_playing);

    let outcome = h.orchestrator.switch_content(short("good")).await.unwrap();
    assert_eq!(outcome, SwitchOutcome::Loaded);
    assert_eq!(h.orchestrator.state().last_error, None);
}

#[tokio::test(start_paused = true)]
async fn progress_is_saved_on_switch_away_and_restored() {
    let h = movie_harness().await;

    h.orchestrator.switch_content(movie("movie-1")).await.unwrap();
    h.backend.emit(BackendEvent::Position(Duration::from_secs(20)));
    settle().await;

    h.orchestrator.switch_content(movie("movie-2")).await.unwrap();
    assert_eq!(
        h.progress.saved_position("movie-1").await,
        Some(Duration::from_secs(20))
    );

    h.orchestrator.switch_content(movie("movie-1")).await.unwrap();
    assert_eq!(h.orchestrator.state().position, Duration::from_secs(20));
    assert_eq!(h.backend.position().await, Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn episodes_of_one_series_keep_separate_progress() {
    let h = Harness::new();
    for index in [1, 2] {
        h.backend
            .set_media(&episode_url("s", index), Duration::from_millis(20), MOVIE_LENGTH)
            .await;
    }
    let first_key = ContentKey::new(ContentType::LongForm, "s", 1).progress_key();

    h.orchestrator.switch_content(episode("s", 1)).await.unwrap();
    h.backend.emit(BackendEvent::Position(Duration::from_secs(7)));
    settle().await;

    h.orchestrator.switch_content(episode("s", 2)).await.unwrap();
    assert_eq!(h.orchestrator.state().position, Duration::ZERO);
    assert_eq!(h.backend.position().await, Duration::ZERO);
    assert_eq!(h.progress.saved_position(&first_key).await, Some(Duration::from_secs(7)));

    // Finishing episode 2 leaves episode 1's progress alone
    h.backend.emit(BackendEvent::Position(MOVIE_LENGTH));
    h.backend.emit(BackendEvent::Completed);
    settle().await;
    assert_eq!(h.progress.saved_position(&first_key).await, Some(Duration::from_secs(7)));

    h.orchestrator.switch_content(episode("s", 1)).await.unwrap();
    assert_eq!(h.orchestrator.state().position, Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn saved_position_at_end_restarts_from_zero() {
    let h = movie_harness().await;
    h.progress.save_position("movie-1", MOVIE_LENGTH).await;

    h.orchestrator.switch_content(movie("movie-1")).await.unwrap();

    assert_eq!(h.orchestrator.state().position, Duration::ZERO);
    assert_eq!(h.backend.seek_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn completion_clears_saved_progress() {
    let h = movie_harness().await;

    h.orchestrator.switch_content(movie("movie-1")).await.unwrap();
    h.backend.emit(BackendEvent::Position(Duration::from_secs(30)));
    settle().await;
    assert_eq!(
        h.progress.saved_position("movie-1").await,
        Some(Duration::from_secs(30))
    );

    h.backend.emit(BackendEvent::Completed);
    settle().await;

    let state = h.orchestrator.state();
    assert_eq!(state.position, MOVIE_LENGTH);
    assert!(!state.is_playing);
    assert_eq!(h.progress.saved_position("movie-1").await, None);
}

#[tokio::test(start_paused = true)]
async fn replay_after_completion_follows_the_backend() {
    let h = movie_harness().await;
    h.orchestrator.switch_content(movie("movie-1")).await.unwrap();
    h.backend.emit(BackendEvent::Position(MOVIE_LENGTH));
    h.backend.emit(BackendEvent::Completed);
    settle().await;
    assert_eq!(h.orchestrator.state().position, MOVIE_LENGTH);

    h.orchestrator.play().await;
    let state = h.orchestrator.state();
    assert!(state.is_playing);
    assert_eq!(state.position, Duration::ZERO);
    assert_eq!(h.backend.position().await, Duration::ZERO);

    h.backend.emit(BackendEvent::Position(Duration::from_secs(1)));
    settle().await;
    assert_eq!(h.orchestrator.state().position, Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn looping_short_restarts_on_completion() {
    let h = Harness::new();
    h.media(&url_for("a"), 20).await;
    h.orchestrator.switch_content(short("a")).await.unwrap();

    h.backend.emit(BackendEvent::Position(CLIP_LENGTH));
    h.backend.emit(BackendEvent::Completed);
    settle().await;

    let state = h.orchestrator.state();
    assert_eq!(state.position, Duration::ZERO);
    assert!(state.is_playing);
}

#[tokio::test(start_paused = true)]
async fn cancel_current_operation_supersedes_inflight_switch() {
    let h = Harness::new();
    h.media(&url_for("a"), 200).await;

    let orchestrator = h.orchestrator.clone();
    let pending = tokio::spawn(async move { orchestrator.switch_content(short("a")).await });
    tokio::time::sleep(Duration::from_millis(1)).await;

    h.orchestrator.cancel_current_operation().await;

    assert_eq!(pending.await.unwrap().unwrap(), SwitchOutcome::Superseded);
    let state = h.orchestrator.state();
    assert_eq!(state.status, PlaybackStatus::Idle);
    assert!(!state.has_content());
    assert!(!state.is_playing);
    assert_eq!(h.backend.current_url().await, None);
}

#[tokio::test(start_paused = true)]
async fn cancelled_replacement_releases_the_player() {
    let h = Harness::new();
    h.media(&url_for("a"), 20).await;
    h.media(&url_for("b"), 200).await;
    h.orchestrator.switch_content(short("a")).await.unwrap();

    let orchestrator = h.orchestrator.clone();
    let pending = tokio::spawn(async move { orchestrator.switch_content(short("b")).await });
    tokio::time::sleep(Duration::from_millis(1)).await;
    h.orchestrator.cancel_current_operation().await;

    assert_eq!(pending.await.unwrap().unwrap(), SwitchOutcome::Superseded);
    let state = h.orchestrator.state();
    assert_eq!(state.status, PlaybackStatus::Idle);
    assert_eq!(state.content_id, "");
    assert!(!state.is_playing);
    assert_eq!(h.backend.current_url().await, None);

    // The player is usable again
    h.orchestrator.play().await;
    assert!(!h.orchestrator.state().is_playing);
    assert_eq!(h.orchestrator.switch_content(short("a")).await.unwrap(), SwitchOutcome::Loaded);
    assert!(h.orchestrator.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn cancelled_switch_leaves_a_newer_switch_alone() {
    let h = Harness::new();
    h.media(&url_for("b"), 200).await;
    h.media(&url_for("c"), 20).await;

    let orchestrator = h.orchestrator.clone();
    let cancelled = tokio::spawn(async move { orchestrator.switch_content(short("b")).await });
    tokio::time::sleep(Duration::from_millis(1)).await;
    h.orchestrator.cancel_current_operation().await;

    assert_eq!(h.orchestrator.switch_content(short("c")).await.unwrap(), SwitchOutcome::Loaded);
    assert_eq!(cancelled.await.unwrap().unwrap(), SwitchOutcome::Superseded);

    let state = h.orchestrator.state();
    assert_eq!(state.content_id, "c");
    assert_eq!(state.status, PlaybackStatus::Ready);
    assert_eq!(h.backend.current_url().await, Some(url_for("c")));
}

#[tokio::test(start_paused = true)]
async fn overlapping_cancelled_switches_leave_nothing_loaded() {
    let h = Harness::new();
    h.media(&url_for("b"), 100).await;
    h.media(&url_for("c"), 300).await;

    let orchestrator = h.orchestrator.clone();
    let first = tokio::spawn(async move { orchestrator.switch_content(short("b")).await });
    tokio::time::sleep(Duration::from_millis(1)).await;
    let orchestrator = h.orchestrator.clone();
    let second = tokio::spawn(async move { orchestrator.switch_content(short("c")).await });
    tokio::time::sleep(Duration::from_millis(1)).await;
    h.orchestrator.cancel_current_operation().await;

    assert_eq!(first.await.unwrap().unwrap(), SwitchOutcome::Superseded);
    assert_eq!(second.await.unwrap().unwrap(), SwitchOutcome::Superseded);
    assert_eq!(h.orchestrator.state().status, PlaybackStatus::Idle);
    assert_eq!(h.backend.current_url().await, None);
}

#[tokio::test(start_paused = true)]
async fn cancelling_after_commit_keeps_loaded_content_live() {
    let h = Harness::new();
    h.media(&url_for("a"), 20).await;
    h.orchestrator.switch_content(short("a")).await.unwrap();

    h.orchestrator.cancel_current_operation().await;
    h.backend.emit(BackendEvent::Position(Duration::from_secs(3)));
    settle().await;

    assert_eq!(h.orchestrator.state().position, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn auto_play_off_loads_paused() {
    let h = Harness::new();
    h.media(&url_for("a"), 20).await;

    h.orchestrator.switch_content(short("a").auto_play(false)).await.unwrap();

    assert!(!h.orchestrator.state().is_playing);
    assert_eq!(h.backend.play_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn mute_flag_carries_into_new_content() {
    let h = Harness::new();
    h.media(&url_for("a"), 20).await;

    h.orchestrator.toggle_mute().await;
    h.orchestrator.switch_content(short("a")).await.unwrap();

    assert!(h.orchestrator.state().is_muted);
    assert!(h.backend.is_muted().await);
}
