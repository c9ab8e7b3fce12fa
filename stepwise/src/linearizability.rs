//! Playback engine for the linearizability concept.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use stepwise_core::linearizability::{Policy, RegisterFrame, RunState};
use stepwise_core::rng::{OsRandom, RandomSource};
use stepwise_core::Registry;
use tokio::sync::watch;

use crate::config::DEFAULT_MAX_PROPAGATION_DELAY;
use crate::error::Result;
use crate::timeline::{Advance, Timeline};

struct Inner {
    run: RunState,
    /// Bumped whenever the run restarts (reset, pause, policy or scenario
    /// switch). An in-flight propagation that observes a stale epoch drops
    /// its update instead of corrupting the fresh run.
    epoch: u64,
}

/// Shared handle on one register-scenario run.
///
/// Under [`Policy::Linearizable`] a scripted write updates the register the
/// moment it is recorded. Under [`Policy::NonLinearizable`] the register
/// catches up after a random delay, independent of read resolution, which is
/// re-sampled every time a frame is derived.
#[derive(Clone)]
pub struct Linearizability {
    inner: Arc<RwLock<Inner>>,
    frames: watch::Sender<RegisterFrame>,
    rng: Arc<dyn RandomSource>,
    max_propagation_delay: Duration,
}

impl Linearizability {
    pub fn new(registry: &Registry, scenario: &str) -> Result<Self> {
        Self::with_random(registry, scenario, Arc::new(OsRandom))
    }

    pub fn with_random(
        registry: &Registry,
        scenario: &str,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        let script = registry.register_script(scenario)?;
        let run = RunState::new(script);
        let (frames, _) = watch::channel(run.frame(rng.as_ref()));

        Ok(Self {
            inner: Arc::new(RwLock::new(Inner { run, epoch: 0 })),
            frames,
            rng,
            max_propagation_delay: DEFAULT_MAX_PROPAGATION_DELAY,
        })
    }

    /// Cap on the simulated replica lag; the delay of each write is drawn
    /// uniformly below it.
    pub fn max_propagation_delay(mut self, delay: Duration) -> Self {
        self.max_propagation_delay = delay;
        self
    }

    pub fn policy(&self) -> Policy {
        self.inner.read().run.policy()
    }

    /// Switch policy and start a fresh run of the script.
    ///
    /// Any in-flight write propagation is invalidated.
    pub fn set_policy(&self, policy: Policy) {
        let frame = {
            let mut inner = self.inner.write();
            inner.epoch += 1;
            inner.run.set_policy(policy);
            inner.run.reset();
            inner.run.frame(self.rng.as_ref())
        };

        tracing::debug!(?policy, "policy selected, run restarted");
        self.frames.send_replace(frame);
    }

    /// Swap in another registered script and start a fresh run, keeping the
    /// selected policy.
    pub fn select_scenario(&self, registry: &Registry, scenario: &str) -> Result<()> {
        let script = registry.register_script(scenario)?;

        let frame = {
            let mut inner = self.inner.write();
            let policy = inner.run.policy();
            inner.epoch += 1;
            inner.run = RunState::new(script);
            inner.run.set_policy(policy);
            inner.run.frame(self.rng.as_ref())
        };

        tracing::debug!(scenario, "scenario selected");
        self.frames.send_replace(frame);
        Ok(())
    }

    fn schedule_propagation(&self, value: i64, epoch: u64) {
        let delay = self.max_propagation_delay.mul_f64(self.rng.next_f64());
        let inner = self.inner.clone();
        let frames = self.frames.clone();
        let rng = self.rng.clone();

        tracing::debug!(value, ?delay, "write propagation scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let frame = {
                let mut inner = inner.write();
                if inner.epoch != epoch {
                    tracing::debug!(value, "stale write propagation dropped");
                    return;
                }
                inner.run.set_current_value(value);
                inner.run.frame(rng.as_ref())
            };

            tracing::debug!(value, "write propagated");
            frames.send_replace(frame);
        });
    }
}

impl Timeline for Linearizability {
    type Frame = RegisterFrame;

    fn advance(&self) -> Advance {
        let (tick, epoch, frame) = {
            let mut inner = self.inner.write();
            let tick = inner.run.tick();
            let epoch = inner.epoch;
            (tick, epoch, inner.run.frame(self.rng.as_ref()))
        };

        if let Some(value) = tick.pending_write {
            self.schedule_propagation(value, epoch);
        }

        self.frames.send_replace(frame);
        Advance::Moved
    }

    fn reset(&self) {
        let frame = {
            let mut inner = self.inner.write();
            inner.epoch += 1;
            inner.run.reset();
            inner.run.frame(self.rng.as_ref())
        };

        self.frames.send_replace(frame);
    }

    fn frame(&self) -> RegisterFrame {
        self.inner.read().run.frame(self.rng.as_ref())
    }

    fn subscribe(&self) -> watch::Receiver<RegisterFrame> {
        self.frames.subscribe()
    }

    fn suspend(&self) {
        self.inner.write().epoch += 1;
    }
}
