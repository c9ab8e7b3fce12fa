//! Core types and derivation logic for the stepwise consistency playground.
//!
//! This crate owns everything that does not require an async runtime: the
//! declarative scenario tables, the validated scenario registry, and the
//! three derivers that turn `(script, cursor position)` into the facts a
//! consumer renders.
//!
//! # Concepts
//!
//! - [`linearizability`]: a scripted history of reads and writes against a
//!   single register, replayed on a cyclic timeline. Two read-resolution
//!   policies show what a linearizable and a non-linearizable register
//!   observe.
//! - [`causal`]: a fixed script of events across three nodes, replayed one
//!   step per tick, with author-declared out-of-order annotations and a
//!   single in-flight message.
//! - [`concurrency`]: the same nominal transaction history under two-phase
//!   locking and serializable snapshot isolation, as a dense array of
//!   precomputed snapshots navigated with a clamped index.
//!
//! # Scenarios are data
//!
//! Scripts are plain serializable values registered in a [`Registry`], which
//! validates every scenario once at startup and fails fast with a
//! [`ScenarioError`] on bad references. Playback never revalidates and never
//! fails: navigation clamps or wraps instead of erroring.
//!
//! Derivers hold no hidden state. [`linearizability::RunState`],
//! [`causal::Replay`] and [`concurrency::Stepper`] are owned by whoever
//! drives them, so any number of independent instances can run concurrently.

pub mod causal;
pub mod concurrency;
pub mod linearizability;
pub mod rng;
pub mod scenario;

pub use rng::{OsRandom, RandomSource, SeededRandom};
pub use scenario::{Registry, RegistryBuilder, ScenarioError};
