//! Interval-driven playback of a [`Timeline`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant};
use ulid::Ulid;

use crate::config::PlayerConfig;
use crate::timeline::{Advance, StepBack, Timeline};

struct PlaybackState {
    playing: AtomicBool,
    interval: Mutex<Duration>,
    /// Stamp of the loop currently allowed to drive the cursor. A loop that
    /// observes a different stamp exits without advancing, so at most one
    /// timer ever drives a timeline.
    owner: Mutex<Option<Ulid>>,
}

/// Drives a [`Timeline`] forward on a fixed cadence.
///
/// The Player owns playback only: a recurring tick task, the pause flag and
/// the clamped speed. What a cursor change *means* is the engine's business.
/// Ticks are strictly sequential; each advance completes before the next
/// tick is awaited, so the accumulated state never sees a lost update.
///
/// `start`, `set_speed` (while playing) and manual navigation must be called
/// from within a tokio runtime.
#[derive(Clone)]
pub struct Player<T: Timeline> {
    timeline: T,
    config: PlayerConfig,
    state: Arc<PlaybackState>,
}

impl<T: Timeline> Player<T> {
    pub fn new(timeline: T) -> Self {
        Self::with_config(timeline, PlayerConfig::default())
    }

    pub fn with_config(timeline: T, config: PlayerConfig) -> Self {
        let state = Arc::new(PlaybackState {
            playing: AtomicBool::new(false),
            interval: Mutex::new(config.tick_interval),
            owner: Mutex::new(None),
        });

        Self {
            timeline,
            config,
            state,
        }
    }

    pub fn timeline(&self) -> &T {
        &self.timeline
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        *self.state.interval.lock()
    }

    /// Receiver observing every frame the timeline publishes.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<T::Frame> {
        self.timeline.subscribe()
    }

    /// Begin automatic advancement at the current speed. No-op if already
    /// playing.
    pub fn start(&self) {
        if self.state.playing.swap(true, Ordering::SeqCst) {
            return;
        }
        self.spawn_loop();
    }

    /// Clamp `interval` into the configured bounds, then begin playing.
    pub fn start_with(&self, interval: Duration) {
        self.set_speed(interval);
        self.start();
    }

    /// Stop automatic advancement without losing the cursor position.
    ///
    /// Suspends the timeline even when already paused; a manual advance can
    /// leave delayed work in flight.
    pub fn pause(&self) {
        if self.state.playing.swap(false, Ordering::SeqCst) {
            *self.state.owner.lock() = None;
            tracing::debug!("playback paused");
        }
        self.timeline.suspend();
    }

    /// Manually advance one step; auto-pauses on a terminal timeline.
    /// Available while paused.
    pub fn advance(&self) {
        if let Advance::Complete = self.timeline.advance() {
            self.state.playing.store(false, Ordering::SeqCst);
        }
    }

    /// Stop playback and return the timeline to its initial state.
    pub fn reset(&self) {
        self.state.playing.store(false, Ordering::SeqCst);
        *self.state.owner.lock() = None;
        self.timeline.reset();
        tracing::debug!("playback reset");
    }

    /// Change the tick cadence, clamped to the configured bounds.
    ///
    /// While playing, the running loop is replaced; the new cadence takes
    /// effect on the next tick rather than stretching the current one.
    pub fn set_speed(&self, interval: Duration) {
        let clamped = self.config.clamp(interval);
        *self.state.interval.lock() = clamped;

        if self.is_playing() {
            self.spawn_loop();
        }
    }

    fn spawn_loop(&self) {
        let id = Ulid::new();
        *self.state.owner.lock() = Some(id);

        let timeline = self.timeline.clone();
        let state = self.state.clone();
        let period = self.interval();

        tokio::spawn(async move {
            tracing::debug!(%id, ?period, "playback loop started");

            let mut interval = interval_at(Instant::now() + period, period);

            loop {
                interval.tick().await;

                if *state.owner.lock() != Some(id) {
                    tracing::debug!(%id, "playback loop superseded");
                    break;
                }

                if !state.playing.load(Ordering::SeqCst) {
                    break;
                }

                if let Advance::Complete = timeline.advance() {
                    state.playing.store(false, Ordering::SeqCst);
                    tracing::debug!(%id, "timeline complete, auto-pausing");
                    break;
                }
            }
        });
    }
}

impl<T: StepBack> Player<T> {
    /// Manually step backward; a no-op at the start of the timeline.
    pub fn step_back(&self) {
        self.timeline.step_back();
    }
}
