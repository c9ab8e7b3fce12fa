//! Interval-driven playback of scripted consistency scenarios.
//!
//! Three concept engines replay the scenario tables of [`stepwise_core`]:
//! [`Linearizability`] over a cyclic register timeline, [`CausalOrder`] over
//! a three-node event script, and [`ConcurrencyControl`] over a
//! 2PL-vs-SSI snapshot array. A [`Player`] drives any of them on a
//! recurring tick and a consumer observes frames through a watch channel.
//!
//! ```rust,ignore
//! let registry = Registry::with_defaults()?;
//! let engine = ConcurrencyControl::new(&registry, "write-conflict")?;
//! let player = Player::new(engine.clone());
//! let mut frames = player.subscribe();
//!
//! player.start();
//! while frames.changed().await.is_ok() {
//!     render(&frames.borrow());
//! }
//! ```
//!
//! Engines are independent instances; nothing in this crate is process-wide,
//! so several visualizations can run concurrently without interference.

pub mod config;

mod causal;
mod concurrency;
mod error;
mod linearizability;
mod player;
mod timeline;

pub use causal::CausalOrder;
pub use concurrency::ConcurrencyControl;
pub use error::{Error, Result};
pub use linearizability::Linearizability;
pub use player::Player;
pub use timeline::{Advance, StepBack, Timeline};

pub use config::PlayerConfig;
pub use stepwise_core::causal::CausalFrame;
pub use stepwise_core::concurrency::ConcurrencyFrame;
pub use stepwise_core::linearizability::{Policy, RegisterFrame};
pub use stepwise_core::{OsRandom, RandomSource, Registry, ScenarioError, SeededRandom};
