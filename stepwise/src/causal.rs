//! Playback engine for the causal-order concept.

use std::sync::Arc;

use parking_lot::RwLock;
use stepwise_core::causal::{CausalFrame, CausalScenario, Replay};
use stepwise_core::Registry;
use tokio::sync::watch;

use crate::error::Result;
use crate::timeline::{Advance, Timeline};

/// Shared handle on one causal-scenario replay.
#[derive(Clone)]
pub struct CausalOrder {
    inner: Arc<RwLock<Replay>>,
    frames: watch::Sender<CausalFrame>,
}

impl CausalOrder {
    pub fn new(registry: &Registry, scenario: &str) -> Result<Self> {
        let replay = Replay::new(registry.causal(scenario)?);
        let (frames, _) = watch::channel(replay.frame());

        Ok(Self {
            inner: Arc::new(RwLock::new(replay)),
            frames,
        })
    }

    pub fn scenario(&self) -> Arc<CausalScenario> {
        self.inner.read().scenario().clone()
    }

    /// Swap in another registered scenario, restarting from the sentinel.
    pub fn select_scenario(&self, registry: &Registry, scenario: &str) -> Result<()> {
        let replay = Replay::new(registry.causal(scenario)?);
        let frame = replay.frame();
        *self.inner.write() = replay;

        tracing::debug!(scenario, "scenario selected");
        self.frames.send_replace(frame);
        Ok(())
    }
}

impl Timeline for CausalOrder {
    type Frame = CausalFrame;

    fn advance(&self) -> Advance {
        let (complete, frame) = {
            let mut replay = self.inner.write();
            replay.advance();
            (replay.is_complete(), replay.frame())
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
            let mut replay = self.inner.write();
            replay.reset();
            replay.frame()
        };

        self.frames.send_replace(frame);
    }

    fn frame(&self) -> CausalFrame {
        self.inner.read().frame()
    }

    fn subscribe(&self) -> watch::Receiver<CausalFrame> {
        self.frames.subscribe()
    }
}
