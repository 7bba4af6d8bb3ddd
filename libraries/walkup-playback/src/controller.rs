//! Segment playback controller
//!
//! Plays a bounded window of a track and stops it automatically. Every
//! `play()` call takes a fresh token; the transport callback and the
//! auto-stop timer only touch shared state while their token is still the
//! current one, so a slow start or an old timer can never stop the track
//! that replaced it.
//!
//! ```text
//! play(A) ── token 1 ── transport.play(A) ── Playing(A) ── timer(1) armed
//! play(B) ── timer(1) aborted ── token 2 ── transport.play(B) ── Playing(B) ── timer(2)
//! timer(1) fires late?  token 1 != 2  → no-op
//! ```
//!
//! Transport commands go through a fair lane: a session change and the pause
//! it implies happen while the lane is held, so a later start can never reach
//! the transport ahead of an earlier pause. A start that lands after a
//! `stop()` or `pause()` already abandoned it is paused again.

use crate::types::{PlaybackSnapshot, PlaybackStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use walkup_core::{PlaybackTransport, Player, Result, SongSegment, Track, WalkupError};

/// Mutable session state, only touched inside short critical sections
#[derive(Default)]
struct Session {
    /// Last token handed out
    last_token: u64,

    /// Token allowed to mutate state; `None` once stopped or superseded
    current: Option<u64>,

    status: PlaybackStatus,
    track: Option<Track>,

    /// Segment start within the track
    start: Duration,
    /// When the transport confirmed playback
    started_at: Option<Instant>,
    /// Position captured on pause
    paused_at: Duration,
    duration: Option<Duration>,
    error: Option<String>,

    /// The single armed auto-stop timer
    timer: Option<JoinHandle<()>>,
}

impl Session {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("Auto-stop timer cancelled");
        }
    }

    fn position(&self) -> Duration {
        match self.status {
            PlaybackStatus::Playing => {
                let elapsed = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
                let elapsed = self.duration.map_or(elapsed, |d| elapsed.min(d));
                self.start + elapsed
            }
            PlaybackStatus::Paused => self.paused_at,
            PlaybackStatus::Loading | PlaybackStatus::Error => self.start,
            PlaybackStatus::Idle => Duration::ZERO,
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            current_track: self.track.clone(),
            position: self.position(),
            duration: self.duration,
            error: self.error.clone(),
        }
    }

    fn clear(&mut self) {
        self.current = None;
        self.status = PlaybackStatus::Idle;
        self.track = None;
        self.start = Duration::ZERO;
        self.started_at = None;
        self.paused_at = Duration::ZERO;
        self.duration = None;
        self.error = None;
    }
}

struct Shared<T> {
    transport: T,
    session: Mutex<Session>,
    /// Orders transport commands; held across every pause, released before a start is sent
    lane: tokio::sync::Mutex<()>,
    updates: watch::Sender<PlaybackSnapshot>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.updates.send_replace(session.snapshot());
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        session.cancel_timer();
    }
}

/// Plays walk-up segments through a [`PlaybackTransport`]
///
/// Cheap to clone; all clones drive the same session. The transport is
/// owned here and nowhere else. Dropping the last clone aborts any armed
/// auto-stop timer (use [`SegmentPlayer::shutdown`] to also pause audio).
///
/// # Example
///
/// ```rust,no_run
/// # use walkup_playback::SegmentPlayer;
/// # use walkup_core::{PlaybackTransport, Track};
/// # use std::time::Duration;
/// # async fn demo(transport: impl PlaybackTransport + 'static, track: Track) -> walkup_core::Result<()> {
/// let player = SegmentPlayer::new(transport);
///
/// // 8 seconds starting 30 seconds in
/// player
///     .play(track, Duration::from_secs(30), Some(Duration::from_secs(8)))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SegmentPlayer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for SegmentPlayer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: PlaybackTransport + 'static> SegmentPlayer<T> {
    pub fn new(transport: T) -> Self {
        let (updates, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                transport,
                session: Mutex::new(Session::default()),
                lane: tokio::sync::Mutex::new(()),
                updates,
            }),
        }
    }

    /// Start `track` at `start`, stopping automatically after `duration`
    ///
    /// Returns once the transport has answered. If a newer `play()` (or a
    /// `stop()`/`pause()`) happened meanwhile, the result no longer changes
    /// the session; the transport's own result is still returned to the
    /// caller. A start abandoned by `stop()`/`pause()` that the transport
    /// carried out anyway is paused again.
    ///
    /// # Errors
    /// `Validation` for a zero duration or a start past the end of the
    /// track (checked before any I/O), otherwise the transport's error.
    pub async fn play(
        &self,
        track: Track,
        start: Duration,
        duration: Option<Duration>,
    ) -> Result<()> {
        if duration.is_some_and(|d| d.is_zero()) {
            return Err(WalkupError::validation("segment duration must be positive"));
        }
        if start >= track.duration() {
            return Err(WalkupError::validation(format!(
                "start {:?} is past the end of {} ({:?})",
                start,
                track.name,
                track.duration()
            )));
        }

        let token = {
            let _lane = self.shared.lane.lock().await;
            let mut session = self.shared.lock();
            session.cancel_timer();

            session.last_token += 1;
            let token = session.last_token;
            session.clear();
            session.current = Some(token);
            session.status = PlaybackStatus::Loading;
            session.track = Some(track.clone());
            session.start = start;
            session.duration = duration;

            self.shared.publish(&session);
            token
        };

        debug!(
            token,
            uri = %track.uri,
            start_ms = start.as_millis() as u64,
            duration_ms = duration.map(|d| d.as_millis() as u64),
            "Starting segment"
        );

        let result = self
            .shared
            .transport
            .play(&track.uri, start.as_millis() as u64)
            .await;

        let abandoned = {
            let mut session = self.shared.lock();
            if session.current == Some(token) {
                return self.settle_start(&mut session, token, &track, duration, result);
            }
            session.current.is_none()
        };

        debug!(token, "Start superseded, leaving session untouched");
        if abandoned && result.is_ok() {
            self.silence_abandoned(token).await;
        }
        result
    }

    fn settle_start(
        &self,
        session: &mut Session,
        token: u64,
        track: &Track,
        duration: Option<Duration>,
        result: Result<()>,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                session.status = PlaybackStatus::Playing;
                session.started_at = Some(Instant::now());
                if let Some(duration) = duration {
                    session.timer = Some(self.arm_timer(token, duration));
                }
                self.shared.publish(session);
                info!(token, track = %track.display_name(), "Segment playing");
                Ok(())
            }
            Err(e) => {
                session.current = None;
                session.status = PlaybackStatus::Error;
                session.error = Some(e.user_message());
                self.shared.publish(session);
                warn!(token, error = %e, "Segment failed to start");
                Err(e)
            }
        }
    }

    /// Play a validated walk-up segment
    pub async fn play_segment(&self, segment: &SongSegment) -> Result<()> {
        self.play(
            segment.track().clone(),
            segment.start(),
            Some(segment.duration()),
        )
        .await
    }

    /// Play `player`'s walk-up segment
    ///
    /// # Errors
    /// `Validation` if the player has no song picked.
    pub async fn play_walkup(&self, player: &Player) -> Result<()> {
        let Some(segment) = &player.song else {
            return Err(WalkupError::validation(format!(
                "{} has no walk-up song",
                player.name
            )));
        };
        self.play_segment(segment).await
    }

    fn arm_timer(&self, token: u64, duration: Duration) -> JoinHandle<()> {
        let shared: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(shared) = shared.upgrade() {
                SegmentPlayer { shared }.auto_stop(token).await;
            }
        })
    }

    async fn auto_stop(&self, token: u64) {
        let _lane = self.shared.lane.lock().await;
        {
            let mut session = self.shared.lock();
            if session.current != Some(token) {
                debug!(token, "Stale auto-stop timer ignored");
                return;
            }
            // This task owns the handle; dropping it detaches instead of aborting
            session.timer.take();
            session.clear();
            self.shared.publish(&session);
        }

        info!(token, "Segment finished");
        if let Err(e) = self.shared.transport.pause().await {
            warn!(token, error = %e, "Failed to pause after segment end");
        }
    }

    /// Pause a start that finished after `stop()`/`pause()` gave it up
    async fn silence_abandoned(&self, token: u64) {
        let _lane = self.shared.lane.lock().await;
        let newer_start = self.shared.lock().current.is_some();
        if newer_start {
            return;
        }

        debug!(token, "Abandoned start reached the transport, pausing it");
        self.pause_transport("abandoned start").await;
    }

    /// Pause the current segment
    ///
    /// Playing → Paused (track kept for display); a start still in flight is
    /// abandoned and the session returns to Idle. Does nothing when nothing
    /// is playing. Transport failures are logged, never returned.
    pub async fn pause(&self) {
        let _lane = self.shared.lane.lock().await;
        let was_active = {
            let mut session = self.shared.lock();
            session.cancel_timer();
            session.current = None;

            match session.status {
                PlaybackStatus::Playing => {
                    session.paused_at = session.position();
                    session.started_at = None;
                    session.status = PlaybackStatus::Paused;
                    self.shared.publish(&session);
                    true
                }
                PlaybackStatus::Loading => {
                    session.clear();
                    self.shared.publish(&session);
                    true
                }
                _ => false,
            }
        };

        if was_active {
            debug!("Pausing segment");
            self.pause_transport("pause").await;
        }
    }

    /// Stop playback and return to Idle from any state
    ///
    /// Clears the current track and any error. Transport failures are
    /// logged, never returned.
    pub async fn stop(&self) {
        let _lane = self.shared.lane.lock().await;
        let was_active = {
            let mut session = self.shared.lock();
            session.cancel_timer();
            let was_active = session.status.is_active();
            if session.status != PlaybackStatus::Idle {
                session.clear();
                self.shared.publish(&session);
            }
            was_active
        };

        if was_active {
            debug!("Stopping segment");
            self.pause_transport("stop").await;
        }
    }

    /// Clear an `Error` (or `Paused`) session back to Idle
    pub async fn reset(&self) {
        self.stop().await;
    }

    /// Teardown: cancel the timer and make a best-effort attempt to silence
    /// the transport
    pub async fn shutdown(&self) {
        info!("Shutting down segment player");
        self.stop().await;
    }

    async fn pause_transport(&self, context: &'static str) {
        if let Err(e) = self.shared.transport.pause().await {
            warn!(context, error = %e, "Transport pause failed, ignoring");
        }
    }

    /// Current session state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.shared.lock().status
    }

    /// Receive a snapshot on every state transition
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Whether an auto-stop timer is currently armed
    pub fn has_pending_auto_stop(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    /// Whether the transport finished its readiness handshake
    pub fn is_transport_ready(&self) -> bool {
        self.shared.transport.is_ready()
    }
}
