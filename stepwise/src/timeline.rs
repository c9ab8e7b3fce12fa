//! Seam between the [`Player`](crate::Player) and the concept engines.

use tokio::sync::watch;

/// Outcome of advancing a timeline by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved (or wrapped); keep ticking.
    Moved,
    /// The timeline is at its terminal step; playback should pause.
    Complete,
}

/// A playable cursor over one concept's state.
///
/// Engines are cheap-`Clone` handles sharing their state behind an `Arc`, so
/// the Player, background tasks and the consumer all drive the same run.
/// Every cursor change republishes the frame; the Player never inspects what
/// the change meant.
pub trait Timeline: Clone + Send + Sync + 'static {
    type Frame: Clone + Send + Sync + 'static;

    fn advance(&self) -> Advance;

    fn reset(&self);

    /// Current consumer payload.
    fn frame(&self) -> Self::Frame;

    /// Receiver that observes every published frame.
    fn subscribe(&self) -> watch::Receiver<Self::Frame>;

    /// Playback is pausing; cancel any in-flight delayed work.
    fn suspend(&self) {}
}

/// Timelines that also support manual backward navigation.
pub trait StepBack: Timeline {
    fn step_back(&self);
}
