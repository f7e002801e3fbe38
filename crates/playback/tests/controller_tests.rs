//! Playback behavior under paused tokio time.

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use playback::{PlaybackConfig, PlaybackController, PlaybackState};
use test_utils::{linear_route, run_start};
use tokio::time::{sleep, Instant};

fn controller(cadence_ms: u64) -> PlaybackController {
    PlaybackController::new(PlaybackConfig { cadence_ms })
}

#[tokio::test(start_paused = true)]
async fn test_play_advances_and_stops_at_last_index() {
    let mut playback = controller(100);
    playback.attach_route(linear_route(4, 600));
    playback.play();

    let mut seen = vec![playback.index()];
    while playback.state() == PlaybackState::Playing {
        if playback.next_tick().await {
            seen.push(playback.index());
        }
    }

    assert_eq!(seen, vec![0, 1, 2, 3]);
    assert_eq!(playback.index(), 3);
    assert_eq!(playback.state(), PlaybackState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_follow_cadence() {
    let mut playback = controller(250);
    playback.attach_route(linear_route(10, 600));

    let started = Instant::now();
    playback.play();
    assert!(playback.next_tick().await);
    assert_eq!(started.elapsed(), Duration::from_millis(250));

    assert!(playback.next_tick().await);
    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_pending_ticks() {
    let mut playback = controller(100);
    playback.attach_route(linear_route(10, 600));
    playback.play();

    // Let three ticks queue up without applying them.
    sleep(Duration::from_millis(350)).await;
    playback.stop();
    assert_eq!(playback.index(), 0);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(playback.index(), 0);

    // A new run only sees its own ticks.
    playback.play();
    assert!(playback.next_tick().await);
    assert_eq!(playback.index(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_play_twice_keeps_single_ticker() {
    let mut playback = controller(100);
    playback.attach_route(linear_route(10, 600));
    playback.play();
    playback.play();

    let started = Instant::now();
    playback.next_tick().await;
    playback.next_tick().await;
    assert_eq!(playback.index(), 2);
    assert_eq!(started.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_attach_while_playing_stops_and_rewinds() {
    let mut playback = controller(100);
    playback.attach_route(linear_route(10, 600));
    playback.play();
    playback.next_tick().await;
    playback.next_tick().await;
    assert_eq!(playback.index(), 2);

    playback.attach_route(linear_route(3, 300));
    assert_eq!(playback.state(), PlaybackState::Stopped);
    assert_eq!(playback.index(), 0);
    assert_eq!(playback.route().map(|r| r.len()), Some(3));
}

#[tokio::test]
async fn test_publishes_every_index_change() {
    let mut playback = controller(100);
    let mut rx = playback.subscribe();
    assert!(rx.borrow_and_update().is_none());

    playback.attach_route(linear_route(3, 600));
    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().unwrap();
    assert_eq!(snapshot.index, 0);
    assert_eq!(snapshot.epoch(), run_start());

    playback.step(1);
    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().unwrap();
    assert_eq!(snapshot.index, 1);
    assert_eq!(snapshot.step_duration_secs, 600);
    assert_eq!(snapshot.epoch(), run_start() + ChronoDuration::seconds(600));

    // clamped no-op publishes nothing
    playback.set_index(2);
    rx.borrow_and_update();
    playback.step(1);
    assert!(!rx.has_changed().unwrap());

    playback.reset();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_none());
    assert!(playback.current_point().is_none());
}

#[test]
fn test_current_point_tracks_index() {
    let mut playback = controller(100);
    let route = linear_route(5, 600);
    let expected = route.points()[3];
    playback.attach_route(route);
    playback.set_index(3);
    assert_eq!(playback.current_point(), Some(&expected));
}

#[tokio::test(start_paused = true)]
async fn test_next_tick_pends_while_stopped() {
    let mut playback = controller(100);
    playback.attach_route(linear_route(3, 600));

    let mut tick = tokio_test::task::spawn(playback.next_tick());
    tokio_test::assert_pending!(tick.poll());
    sleep(Duration::from_secs(1)).await;
    tokio_test::assert_pending!(tick.poll());
}
