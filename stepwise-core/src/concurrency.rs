//! Two concurrency-control views of one transaction history.
//!
//! A [`ConcurrencyScenario`] is a dense array of precomputed [`Snapshot`]s:
//! each index fully specifies both tracks' transactions and database value.
//! The instructional content lives in the script; the engine's job is
//! clamped navigation plus lookup, so [`Stepper`] never computes a
//! transition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStepKind {
    Read,
    Write,
    Commit,
    Abort,
}

/// One row of a transaction's history at a given snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStep {
    pub kind: TxStepKind,
    pub value: String,
    /// The row currently holds a lock. Only ever true on the 2PL track;
    /// snapshot isolation never blocks.
    #[serde(default)]
    pub locked: bool,
    /// Authored annotation for the rendering layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TxStep {
    pub fn read(value: impl Into<String>) -> Self {
        Self::new(TxStepKind::Read, value)
    }

    pub fn write(value: impl Into<String>) -> Self {
        Self::new(TxStepKind::Write, value)
    }

    pub fn commit(value: impl Into<String>) -> Self {
        Self::new(TxStepKind::Commit, value)
    }

    pub fn abort(value: impl Into<String>) -> Self {
        Self::new(TxStepKind::Abort, value)
    }

    fn new(kind: TxStepKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            locked: false,
            note: None,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u32,
    pub steps: Vec<TxStep>,
}

impl Transaction {
    pub fn new(id: u32, steps: Vec<TxStep>) -> Self {
        Self { id, steps }
    }
}

/// The shared scalar per policy track. The two tracks evolve independently
/// and may diverge; that divergence is the point of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbState {
    pub twopl: i64,
    pub ssi: i64,
}

/// Both tracks' full state at one step index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub twopl: Vec<Transaction>,
    pub ssi: Vec<Transaction>,
    pub db_state: DbState,
    pub commentary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyScenario {
    pub name: String,
    pub snapshots: Vec<Snapshot>,
}

impl ConcurrencyScenario {
    /// Highest valid step index.
    pub fn max_steps(&self) -> usize {
        self.snapshots.len().saturating_sub(1)
    }

    pub fn snapshot(&self, index: usize) -> &Snapshot {
        &self.snapshots[index.min(self.max_steps())]
    }
}

/// The canonical write-write conflict: 2PL serializes both transactions,
/// SSI aborts the second.
pub fn write_conflict() -> ConcurrencyScenario {
    ConcurrencyScenario {
        name: "write-conflict".to_owned(),
        snapshots: vec![
            Snapshot {
                twopl: vec![],
                ssi: vec![],
                db_state: DbState {
                    twopl: 100,
                    ssi: 100,
                },
                commentary: "Initial state. Database value A = 100.".to_owned(),
            },
            Snapshot {
                twopl: vec![Transaction::new(
                    1,
                    vec![TxStep::read("A = 100")
                        .locked()
                        .note("T1 acquires a read lock")],
                )],
                ssi: vec![Transaction::new(
                    1,
                    vec![TxStep::read("A = 100").note("T1 reads from its snapshot")],
                )],
                db_state: DbState {
                    twopl: 100,
                    ssi: 100,
                },
                commentary: "T1 starts and reads the value of A. In 2PL, it acquires a \
                             lock. In SSI, it reads from its snapshot."
                    .to_owned(),
            },
            Snapshot {
                twopl: vec![
                    Transaction::new(
                        1,
                        vec![
                            TxStep::read("A = 100").locked().note("T1 holds the lock"),
                            TxStep::write("A = 150").locked().note("T1 writes under lock"),
                        ],
                    ),
                    Transaction::new(
                        2,
                        vec![TxStep::read("Waiting for lock...").note("T2 waits for T1's lock")],
                    ),
                ],
                ssi: vec![
                    Transaction::new(
                        1,
                        vec![
                            TxStep::read("A = 100").note("T1's snapshot"),
                            TxStep::write("A = 150").note("T1 writes to its local copy"),
                        ],
                    ),
                    Transaction::new(
                        2,
                        vec![TxStep::read("A = 100").note("T2 reads from its own snapshot")],
                    ),
                ],
                db_state: DbState {
                    twopl: 100,
                    ssi: 100,
                },
                commentary: "T1 writes A = 150. T2 tries to read. In 2PL, T2 waits. In \
                             SSI, T2 reads the old value from its snapshot."
                    .to_owned(),
            },
            Snapshot {
                twopl: vec![
                    Transaction::new(
                        1,
                        vec![
                            TxStep::read("A = 100").note("T1 releases lock"),
                            TxStep::write("A = 150").note("T1 commits"),
                        ],
                    ),
                    Transaction::new(
                        2,
                        vec![TxStep::read("A = 150")
                            .locked()
                            .note("T2 acquires lock and reads new value")],
                    ),
                ],
                ssi: vec![
                    Transaction::new(
                        1,
                        vec![
                            TxStep::read("A = 100").note("T1's initial read"),
                            TxStep::write("A = 150").note("T1 commits"),
                        ],
                    ),
                    Transaction::new(
                        2,
                        vec![
                            TxStep::read("A = 100").note("T2's snapshot is unchanged"),
                            TxStep::write("A = 200").note("T2 writes to its local copy"),
                        ],
                    ),
                ],
                db_state: DbState {
                    twopl: 150,
                    ssi: 150,
                },
                commentary: "T1 commits. In 2PL, T2 can now read the new value. In SSI, \
                             T2 continues with its old snapshot."
                    .to_owned(),
            },
            Snapshot {
                twopl: vec![
                    Transaction::new(
                        1,
                        vec![TxStep::read("A = 100"), TxStep::write("A = 150")],
                    ),
                    Transaction::new(
                        2,
                        vec![
                            TxStep::read("A = 150").locked(),
                            TxStep::write("A = 200").locked().note("T2 writes under lock"),
                        ],
                    ),
                ],
                ssi: vec![
                    Transaction::new(
                        1,
                        vec![
                            TxStep::read("A = 100"),
                            TxStep::write("A = 150"),
                            TxStep::commit("Success").note("T1 committed successfully"),
                        ],
                    ),
                    Transaction::new(
                        2,
                        vec![
                            TxStep::read("A = 100"),
                            TxStep::write("A = 200"),
                            TxStep::commit("Conflict detected!")
                                .note("T2 detects write-write conflict"),
                        ],
                    ),
                ],
                db_state: DbState {
                    twopl: 150,
                    ssi: 150,
                },
                commentary: "T2 tries to commit. In 2PL, it succeeds. In SSI, a conflict \
                             is detected because T1 and T2 both tried to update A."
                    .to_owned(),
            },
            Snapshot {
                twopl: vec![
                    Transaction::new(
                        1,
                        vec![TxStep::read("A = 100"), TxStep::write("A = 150")],
                    ),
                    Transaction::new(
                        2,
                        vec![TxStep::read("A = 150"), TxStep::write("A = 200")],
                    ),
                ],
                ssi: vec![
                    Transaction::new(
                        1,
                        vec![
                            TxStep::read("A = 100"),
                            TxStep::write("A = 150"),
                            TxStep::commit("Success"),
                        ],
                    ),
                    Transaction::new(
                        2,
                        vec![
                            TxStep::read("A = 100"),
                            TxStep::write("A = 200"),
                            TxStep::abort("Transaction aborted")
                                .note("T2 must abort due to conflict"),
                        ],
                    ),
                ],
                db_state: DbState {
                    twopl: 200,
                    ssi: 150,
                },
                commentary: "Final state. In 2PL, both transactions committed \
                             sequentially. In SSI, T2 had to abort due to a conflict."
                    .to_owned(),
            },
        ],
    }
}

/// Per-step payload for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyFrame {
    pub step_index: usize,
    pub twopl: Vec<Transaction>,
    pub ssi: Vec<Transaction>,
    pub db_state: DbState,
    pub commentary: String,
}

/// Clamped walk over a scenario's snapshot array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stepper {
    scenario: Arc<ConcurrencyScenario>,
    step_index: usize,
}

impl Stepper {
    pub fn new(scenario: Arc<ConcurrencyScenario>) -> Self {
        Self {
            scenario,
            step_index: 0,
        }
    }

    pub fn scenario(&self) -> &Arc<ConcurrencyScenario> {
        &self.scenario
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn is_complete(&self) -> bool {
        self.step_index >= self.scenario.max_steps()
    }

    /// Move to the next snapshot; a no-op at the end.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.step_index += 1;
        true
    }

    /// Move to the previous snapshot; a no-op at the start.
    pub fn step_back(&mut self) -> bool {
        if self.step_index == 0 {
            return false;
        }
        self.step_index -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.step_index = 0;
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.scenario.snapshot(self.step_index)
    }

    pub fn frame(&self) -> ConcurrencyFrame {
        let snapshot = self.snapshot();
        ConcurrencyFrame {
            step_index: self.step_index,
            twopl: snapshot.twopl.clone(),
            ssi: snapshot.ssi.clone(),
            db_state: snapshot.db_state,
            commentary: snapshot.commentary.clone(),
        }
    }
}
