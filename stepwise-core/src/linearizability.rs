//! Scripted read/write history against a single register.
//!
//! A [`RegisterScript`] fires operations at fixed points on a cyclic
//! timeline. [`RunState`] replays it one tick at a time, accumulating the
//! operations of the current cycle, and [`resolve_read`] derives what each
//! read observes under the selected [`Policy`].
//!
//! The non-linearizable rule (`write.start_time <= read.end_time`, uniform
//! choice) is a teaching heuristic carried over unchanged from the scenario
//! it animates, not a general linearizability decision procedure.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

/// Value a read observes before any write qualifies.
pub const INITIAL_VALUE: i64 = 0;

/// Read-resolution policy for the shared register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Reads observe the last write whose interval ended before they began.
    Linearizable,
    /// Reads observe a uniformly random write that has started, modeling a
    /// register whose replicas lag behind.
    NonLinearizable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Write,
    Read,
}

/// One scripted operation of a register scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedOp {
    pub kind: OpKind,
    pub start_time: u32,
    /// Written value. A scripted write without a value records
    /// `current value + 1` at the moment it fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl ScriptedOp {
    pub fn write(start_time: u32, value: i64) -> Self {
        Self {
            kind: OpKind::Write,
            start_time,
            value: Some(value),
        }
    }

    pub fn read(start_time: u32) -> Self {
        Self {
            kind: OpKind::Read,
            start_time,
            value: None,
        }
    }
}

/// Declarative script for the linearizability concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterScript {
    pub name: String,
    /// Length of the cyclic timeline; the cursor lives in `[0, total_duration)`.
    pub total_duration: u32,
    /// Fixed width of every operation box on the timeline.
    pub op_duration: u32,
    pub ops: Vec<ScriptedOp>,
}

impl RegisterScript {
    pub fn op_at(&self, time: u32) -> Option<&ScriptedOp> {
        self.ops.iter().find(|op| op.start_time == time)
    }
}

/// The canonical two-writes-two-reads script.
pub fn single_register() -> RegisterScript {
    RegisterScript {
        name: "single-register".to_owned(),
        total_duration: 100,
        op_duration: 10,
        ops: vec![
            ScriptedOp::write(5, 1),
            ScriptedOp::read(15),
            ScriptedOp::write(25, 2),
            ScriptedOp::read(35),
        ],
    }
}

/// An operation recorded during the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Creation order, monotonically increasing across cycles of a run.
    pub id: u64,
    pub kind: OpKind,
    pub start_time: u32,
    pub end_time: u32,
    /// Present only for writes. Reads resolve their value on demand.
    pub value: Option<i64>,
}

/// Outcome of advancing the cursor by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// The cursor wrapped to zero and the operation list was cleared.
    pub wrapped: bool,
    /// Value written this tick that still awaits replica propagation
    /// (non-linearizable policy only).
    pub pending_write: Option<i64>,
}

/// Resolve the value `read` observes against the accumulated history.
///
/// Linearizable: the last write in creation order with
/// `end_time <= read.start_time`, falling back to [`INITIAL_VALUE`]. Once a
/// write's interval has ended no later than the read begins, every later
/// read must observe it or a newer write.
///
/// Non-linearizable: a uniform choice among writes with
/// `start_time <= read.end_time`, so a read may return a stale or a
/// not-yet-committed value. Resolution is sampled fresh on every call; two
/// queries of the same read may legitimately differ.
pub fn resolve_read(
    read: &Operation,
    history: &[Operation],
    policy: Policy,
    rng: &dyn RandomSource,
) -> i64 {
    match policy {
        Policy::Linearizable => history
            .iter()
            .filter(|op| op.kind == OpKind::Write && op.end_time <= read.start_time)
            .last()
            .and_then(|op| op.value)
            .unwrap_or(INITIAL_VALUE),
        Policy::NonLinearizable => {
            let eligible: Vec<i64> = history
                .iter()
                .filter(|op| op.kind == OpKind::Write && op.start_time <= read.end_time)
                .filter_map(|op| op.value)
                .collect();

            if eligible.is_empty() {
                INITIAL_VALUE
            } else {
                eligible[rng.pick(eligible.len())]
            }
        }
    }
}

/// View of one operation inside a [`RegisterFrame`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationView {
    pub id: u64,
    pub kind: OpKind,
    pub start_time: u32,
    pub end_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Resolved value for reads, sampled at frame derivation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<i64>,
}

/// Per-tick payload for the rendering layer.
///
/// Positions on screen are the consumer's business; it maps `start_time` and
/// `end_time` through its own time-to-pixel function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFrame {
    pub current_time: u32,
    pub policy: Policy,
    pub current_value: i64,
    pub operations: Vec<OperationView>,
}

/// One playback run of a register script.
///
/// Owns the cursor, the operations accumulated during the current cycle, and
/// the shared register value. The list is append-only within a cycle and
/// cleared when the cursor wraps.
#[derive(Debug, Clone)]
pub struct RunState {
    script: Arc<RegisterScript>,
    policy: Policy,
    current_time: u32,
    current_value: i64,
    operations: Vec<Operation>,
    next_id: u64,
}

impl RunState {
    pub fn new(script: Arc<RegisterScript>) -> Self {
        Self {
            script,
            policy: Policy::Linearizable,
            current_time: 0,
            current_value: INITIAL_VALUE,
            operations: Vec::new(),
            next_id: 1,
        }
    }

    pub fn script(&self) -> &Arc<RegisterScript> {
        &self.script
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    pub fn current_time(&self) -> u32 {
        self.current_time
    }

    pub fn current_value(&self) -> i64 {
        self.current_value
    }

    /// Apply a propagated write to the shared register.
    pub fn set_current_value(&mut self, value: i64) {
        self.current_value = value;
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Advance the cursor by one tick, wrapping modulo the script duration.
    ///
    /// Wrapping to zero clears the accumulated operations and starts a fresh
    /// cycle of the script. If the script fires an operation at the new
    /// cursor position it is recorded; a write is applied to the register
    /// synchronously under [`Policy::Linearizable`] and reported as
    /// [`Tick::pending_write`] otherwise, leaving propagation to the caller.
    pub fn tick(&mut self) -> Tick {
        self.current_time = (self.current_time + 1) % self.script.total_duration;

        let wrapped = self.current_time == 0;
        if wrapped {
            self.operations.clear();
        }

        let mut pending_write = None;
        if let Some(scripted) = self.script.op_at(self.current_time) {
            let value = match scripted.kind {
                OpKind::Write => Some(scripted.value.unwrap_or(self.current_value + 1)),
                OpKind::Read => None,
            };

            self.operations.push(Operation {
                id: self.next_id,
                kind: scripted.kind,
                start_time: self.current_time,
                end_time: (self.current_time + self.script.op_duration)
                    % self.script.total_duration,
                value,
            });
            self.next_id += 1;

            if let Some(value) = value {
                match self.policy {
                    Policy::Linearizable => self.current_value = value,
                    Policy::NonLinearizable => pending_write = Some(value),
                }
            }
        }

        Tick {
            wrapped,
            pending_write,
        }
    }

    /// Return the cursor to time zero and discard the accumulated run.
    ///
    /// The policy is selection state, not run state, and survives a reset.
    pub fn reset(&mut self) {
        self.current_time = 0;
        self.current_value = INITIAL_VALUE;
        self.operations.clear();
        self.next_id = 1;
    }

    /// Derive the consumer payload for the current cursor position.
    ///
    /// Read values are resolved here, fresh on every call.
    pub fn frame(&self, rng: &dyn RandomSource) -> RegisterFrame {
        let operations = self
            .operations
            .iter()
            .map(|op| OperationView {
                id: op.id,
                kind: op.kind,
                start_time: op.start_time,
                end_time: op.end_time,
                value: op.value,
                observed: match op.kind {
                    OpKind::Read => Some(resolve_read(op, &self.operations, self.policy, rng)),
                    OpKind::Write => None,
                },
            })
            .collect();

        RegisterFrame {
            current_time: self.current_time,
            policy: self.policy,
            current_value: self.current_value,
            operations,
        }
    }
}
