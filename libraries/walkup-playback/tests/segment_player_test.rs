//! Integration tests for SegmentPlayer
//!
//! All tests run on a paused clock, so timer deadlines are exact.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use walkup_core::error::REASON_NO_ACTIVE_DEVICE;
use walkup_core::{
    PlaybackTransport, Player, Result, SegmentPolicy, SongSegment, Track, WalkupError,
};
use walkup_playback::{PlaybackStatus, SegmentPlayer};

// ===== Test Transport =====

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Play(String, u64),
    Pause,
}

/// Records commands; audio starts when a play call completes and ends when a
/// pause completes, like a remote device
#[derive(Default)]
struct FakeTransport {
    calls: Mutex<Vec<Call>>,
    delays: Mutex<HashMap<String, Duration>>,
    pause_delay: Mutex<Option<Duration>>,
    play_error: Mutex<Option<WalkupError>>,
    fail_pause: AtomicBool,
    audible: AtomicBool,
}

impl FakeTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn delay(&self, uri: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(uri.to_string(), delay);
    }

    fn slow_pause(&self, delay: Duration) {
        *self.pause_delay.lock().unwrap() = Some(delay);
    }

    fn is_audible(&self) -> bool {
        self.audible.load(Ordering::SeqCst)
    }

    fn fail_play_with(&self, error: WalkupError) {
        *self.play_error.lock().unwrap() = Some(error);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn pause_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Pause).count()
    }
}

#[async_trait]
impl PlaybackTransport for FakeTransport {
    async fn play(&self, uri: &str, start_position_ms: u64) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Play(uri.to_string(), start_position_ms));

        let delay = self.delays.lock().unwrap().get(uri).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.play_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => {
                self.audible.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn pause(&self) -> Result<()> {
        let delay = *self.pause_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().unwrap().push(Call::Pause);
        self.audible.store(false, Ordering::SeqCst);
        if self.fail_pause.load(Ordering::SeqCst) {
            return Err(WalkupError::network("device went away"));
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }
}

// ===== Helpers =====

fn track(id: &str) -> Track {
    Track::new(
        id,
        format!("spotify:track:{}", id),
        format!("Song {}", id),
        Duration::from_secs(180),
    )
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn ms(m: u64) -> Duration {
    Duration::from_millis(m)
}

async fn wait_for_status(player: &SegmentPlayer<Arc<FakeTransport>>, status: PlaybackStatus) {
    while player.status() != status {
        tokio::task::yield_now().await;
    }
}

// ===== Auto-stop =====

#[tokio::test(start_paused = true)]
async fn test_segment_stops_after_duration() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(30), Some(secs(8)))
        .await
        .unwrap();
    assert_eq!(player.status(), PlaybackStatus::Playing);
    assert!(player.has_pending_auto_stop());

    tokio::time::sleep(ms(7999)).await;
    assert_eq!(player.status(), PlaybackStatus::Playing);

    tokio::time::sleep(ms(2)).await;
    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert!(!player.has_pending_auto_stop());
    assert!(player.snapshot().current_track.is_none());

    assert_eq!(
        transport.calls(),
        vec![
            Call::Play("spotify:track:a".to_string(), 30_000),
            Call::Pause
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_duration_plays_until_stopped() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player.play(track("a"), secs(0), None).await.unwrap();
    assert!(!player.has_pending_auto_stop());

    tokio::time::sleep(secs(120)).await;
    assert_eq!(player.status(), PlaybackStatus::Playing);
    assert_eq!(transport.pause_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_position_advances_while_playing() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(30), Some(secs(8)))
        .await
        .unwrap();
    tokio::time::sleep(secs(3)).await;

    let snapshot = player.snapshot();
    assert_eq!(snapshot.position, secs(33));
    assert_eq!(snapshot.duration, Some(secs(8)));
}

// ===== Token safety =====

#[tokio::test(start_paused = true)]
async fn test_replaced_segment_timer_never_fires() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(10), Some(secs(2)))
        .await
        .unwrap();
    player
        .play(track("b"), secs(40), Some(secs(8)))
        .await
        .unwrap();

    // A's deadline has passed; B must still be playing
    tokio::time::sleep(secs(3)).await;
    assert_eq!(transport.pause_count(), 0);
    assert_eq!(player.status(), PlaybackStatus::Playing);
    assert_eq!(player.snapshot().current_track, Some(track("b")));

    tokio::time::sleep(secs(6)).await;
    assert_eq!(transport.pause_count(), 1);
    assert_eq!(player.status(), PlaybackStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_slow_start_does_not_overwrite_newer_segment() {
    let transport = FakeTransport::new();
    transport.delay("spotify:track:a", secs(5));
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let slow = {
        let player = player.clone();
        tokio::spawn(async move { player.play(track("a"), secs(0), Some(secs(20))).await })
    };
    wait_for_status(&player, PlaybackStatus::Loading).await;

    player
        .play(track("b"), secs(0), Some(secs(8)))
        .await
        .unwrap();
    assert_eq!(player.status(), PlaybackStatus::Playing);

    // The superseded start still reports its own outcome
    slow.await.unwrap().unwrap();

    let snapshot = player.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Playing);
    assert_eq!(snapshot.current_track, Some(track("b")));

    // Only B's timer is armed
    tokio::time::sleep(secs(9)).await;
    assert_eq!(player.status(), PlaybackStatus::Idle);
    tokio::time::sleep(secs(30)).await;
    assert_eq!(transport.pause_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_slow_start_stays_idle() {
    let transport = FakeTransport::new();
    transport.delay("spotify:track:a", secs(5));
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let slow = {
        let player = player.clone();
        tokio::spawn(async move { player.play(track("a"), secs(0), Some(secs(8))).await })
    };
    wait_for_status(&player, PlaybackStatus::Loading).await;

    player.stop().await;
    assert!(!transport.is_audible());

    // The device only starts after the stop was sent; it gets paused again
    slow.await.unwrap().unwrap();

    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert!(!player.has_pending_auto_stop());
    assert!(!transport.is_audible());
    assert_eq!(
        transport.calls(),
        vec![
            Call::Play("spotify:track:a".to_string(), 0),
            Call::Pause,
            Call::Pause
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_slow_start_leaves_device_silent() {
    let transport = FakeTransport::new();
    transport.delay("spotify:track:a", secs(2));
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let slow = {
        let player = player.clone();
        tokio::spawn(async move { player.play(track("a"), secs(0), Some(secs(8))).await })
    };
    wait_for_status(&player, PlaybackStatus::Loading).await;

    player.shutdown().await;
    slow.await.unwrap().unwrap();

    tokio::time::sleep(secs(60)).await;
    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert!(!player.has_pending_auto_stop());
    assert!(!transport.is_audible());
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_slow_start_leaves_device_silent() {
    let transport = FakeTransport::new();
    transport.delay("spotify:track:a", secs(2));
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let slow = {
        let player = player.clone();
        tokio::spawn(async move { player.play(track("a"), secs(0), Some(secs(8))).await })
    };
    wait_for_status(&player, PlaybackStatus::Loading).await;

    player.pause().await;
    slow.await.unwrap().unwrap();

    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert!(!transport.is_audible());
    assert_eq!(transport.pause_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_start_after_auto_stop_waits_for_its_pause() {
    let transport = FakeTransport::new();
    transport.slow_pause(secs(1));
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(0), Some(secs(2)))
        .await
        .unwrap();

    // A's auto-stop fired at 2s; its pause lands at 3s
    tokio::time::sleep(ms(2500)).await;
    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert!(transport.is_audible());

    player
        .play(track("b"), secs(0), Some(secs(8)))
        .await
        .unwrap();

    assert_eq!(
        transport.calls(),
        vec![
            Call::Play("spotify:track:a".to_string(), 0),
            Call::Pause,
            Call::Play("spotify:track:b".to_string(), 0),
        ]
    );
    assert!(transport.is_audible());
    assert_eq!(player.status(), PlaybackStatus::Playing);
}

// ===== Failures =====

#[tokio::test(start_paused = true)]
async fn test_start_failure_enters_error_state() {
    let transport = FakeTransport::new();
    transport.fail_play_with(WalkupError::NotFound {
        message: "Player command failed: No active device found".to_string(),
        reason: Some(REASON_NO_ACTIVE_DEVICE.to_string()),
    });
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let result = player.play(track("a"), secs(0), Some(secs(8))).await;
    assert!(matches!(result, Err(WalkupError::NotFound { .. })));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Error);
    assert_eq!(snapshot.error.as_deref(), Some("No active playback device"));
    assert!(!player.has_pending_auto_stop());

    // Error is not active, so clearing it does not touch the transport
    player.stop().await;
    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert!(player.snapshot().error.is_none());
    assert_eq!(transport.pause_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_pause_failure_is_swallowed() {
    let transport = FakeTransport::new();
    transport.fail_pause.store(true, Ordering::SeqCst);
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(0), Some(secs(8)))
        .await
        .unwrap();
    player.stop().await;
    assert_eq!(player.status(), PlaybackStatus::Idle);

    player
        .play(track("b"), secs(0), Some(secs(8)))
        .await
        .unwrap();
    tokio::time::sleep(secs(9)).await;
    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert_eq!(transport.pause_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_requests_never_reach_transport() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let zero = player.play(track("a"), secs(0), Some(Duration::ZERO)).await;
    assert!(matches!(zero, Err(WalkupError::Validation(_))));

    let past_end = player.play(track("a"), secs(180), Some(secs(8))).await;
    assert!(matches!(past_end, Err(WalkupError::Validation(_))));

    assert!(transport.calls().is_empty());
    assert_eq!(player.status(), PlaybackStatus::Idle);
}

// ===== Pause / Stop =====

#[tokio::test(start_paused = true)]
async fn test_pause_keeps_track_and_cancels_timer() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(30), Some(secs(8)))
        .await
        .unwrap();
    tokio::time::sleep(secs(3)).await;
    player.pause().await;

    let snapshot = player.snapshot();
    assert_eq!(snapshot.status, PlaybackStatus::Paused);
    assert_eq!(snapshot.current_track, Some(track("a")));
    assert_eq!(snapshot.position, secs(33));
    assert!(!player.has_pending_auto_stop());

    tokio::time::sleep(secs(30)).await;
    assert_eq!(player.status(), PlaybackStatus::Paused);
    assert_eq!(transport.pause_count(), 1);

    player.reset().await;
    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert_eq!(transport.pause_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_when_idle_is_silent() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player.stop().await;
    player.pause().await;

    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_player_disarms_timer() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(0), Some(secs(8)))
        .await
        .unwrap();
    drop(player);

    tokio::time::sleep(secs(10)).await;
    assert_eq!(transport.pause_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_silences_transport() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    player
        .play(track("a"), secs(0), Some(secs(8)))
        .await
        .unwrap();
    player.shutdown().await;

    assert_eq!(player.status(), PlaybackStatus::Idle);
    assert_eq!(transport.pause_count(), 1);
}

// ===== Observers =====

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_transitions() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));
    let mut updates = player.subscribe();
    assert_eq!(updates.borrow_and_update().status, PlaybackStatus::Idle);

    player
        .play(track("a"), secs(0), Some(secs(8)))
        .await
        .unwrap();
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().status, PlaybackStatus::Playing);

    tokio::time::sleep(secs(9)).await;
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().status, PlaybackStatus::Idle);
}

// ===== Walk-up songs =====

#[tokio::test(start_paused = true)]
async fn test_play_walkup_uses_player_segment() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let segment =
        SongSegment::new(track("a"), secs(45), secs(12), &SegmentPolicy::default()).unwrap();
    let batter = Player::new("Avery").with_song(segment);

    player.play_walkup(&batter).await.unwrap();
    assert_eq!(
        transport.calls(),
        vec![Call::Play("spotify:track:a".to_string(), 45_000)]
    );
    assert_eq!(player.snapshot().duration, Some(secs(12)));
    assert!(player.is_transport_ready());
}

#[tokio::test(start_paused = true)]
async fn test_play_walkup_without_song_is_rejected() {
    let transport = FakeTransport::new();
    let player = SegmentPlayer::new(Arc::clone(&transport));

    let result = player.play_walkup(&Player::new("Blake")).await;
    assert!(matches!(result, Err(WalkupError::Validation(_))));
    assert!(transport.calls().is_empty());
}
