//! Playback engine for the concurrency-control concept.

use std::sync::Arc;

use parking_lot::RwLock;
use stepwise_core::concurrency::{ConcurrencyFrame, ConcurrencyScenario, Stepper};
use stepwise_core::Registry;
use tokio::sync::watch;

use crate::error::Result;
use crate::timeline::{Advance, StepBack, Timeline};

/// Shared handle on one 2PL-vs-SSI walkthrough.
#[derive(Clone)]
pub struct ConcurrencyControl {
    inner: Arc<RwLock<Stepper>>,
    frames: watch::Sender<ConcurrencyFrame>,
}

impl ConcurrencyControl {
    pub fn new(registry: &Registry, scenario: &str) -> Result<Self> {
        let stepper = Stepper::new(registry.concurrency(scenario)?);
        let (frames, _) = watch::channel(stepper.frame());

        Ok(Self {
            inner: Arc::new(RwLock::new(stepper)),
            frames,
        })
    }

    pub fn scenario(&self) -> Arc<ConcurrencyScenario> {
        self.inner.read().scenario().clone()
    }

    /// Swap in another registered scenario, restarting at step zero.
    pub fn select_scenario(&self, registry: &Registry, scenario: &str) -> Result<()> {
        let stepper = Stepper::new(registry.concurrency(scenario)?);
        let frame = stepper.frame();
        *self.inner.write() = stepper;

        tracing::debug!(scenario, "scenario selected");
        self.frames.send_replace(frame);
        Ok(())
    }
}

impl Timeline for ConcurrencyControl {
    type Frame = ConcurrencyFrame;

    fn advance(&self) -> Advance {
        let (complete, frame) = {
            let mut stepper = self.inner.write();
            stepper.advance();
            (stepper.is_complete(), stepper.frame())
        };

        self.frames.send_replace(frame);
        if complete {
            Advance::Complete
        } else {
            Advance::Moved
        }
    }

    fn reset(&self) {
        let frame = {
            let mut stepper = self.inner.write();
            stepper.reset();
            stepper.frame()
        };

        self.frames.send_replace(frame);
    }

    fn frame(&self) -> ConcurrencyFrame {
        self.inner.read().frame()
    }

    fn subscribe(&self) -> watch::Receiver<ConcurrencyFrame> {
        self.frames.subscribe()
    }
}

impl StepBack for ConcurrencyControl {
    fn step_back(&self) {
        let frame = {
            let mut stepper = self.inner.write();
            stepper.step_back();
            stepper.frame()
        };

        self.frames.send_replace(frame);
    }
}
