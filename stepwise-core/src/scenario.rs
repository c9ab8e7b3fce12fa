//! Validated registry of scenario tables.
//!
//! Scenarios are configuration, not code: new ones can be authored (or
//! deserialized) without touching engine logic, as long as they pass the
//! registry's startup validation. Lookups after [`RegistryBuilder::build`]
//! cannot encounter a malformed script; bad references fail fast here, not
//! mid-playback.

use std::collections::HashMap;
use std::sync::Arc;

use crate::causal::{self, CausalScenario};
use crate::concurrency::{self, ConcurrencyScenario};
use crate::linearizability::{self, OpKind, RegisterScript};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("unknown {kind} scenario `{name}`")]
    UnknownScenario { kind: &'static str, name: String },

    #[error("duplicate {kind} scenario `{name}`")]
    DuplicateScenario { kind: &'static str, name: String },

    #[error("{kind} scenario `{name}` has no steps")]
    EmptyScript { kind: &'static str, name: String },

    #[error("register script `{name}`: total duration must be non-zero")]
    ZeroDuration { name: String },

    #[error("register script `{name}`: op at {start_time} is outside [0, {total_duration})")]
    OpOutOfRange {
        name: String,
        start_time: u32,
        total_duration: u32,
    },

    #[error("register script `{name}`: read at {start_time} carries a value")]
    ValueOnRead { name: String, start_time: u32 },

    #[error("causal scenario `{name}`: step {index} names event `{event}` missing from node {node}")]
    UnknownEvent {
        name: String,
        index: usize,
        node: causal::NodeId,
        event: String,
    },

    #[error("concurrency scenario `{name}`: snapshot {index} has a locked SSI row (SSI never blocks)")]
    LockedSsiRow { name: String, index: usize },
}

/// Immutable, shared scenario tables, one namespace per concept.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    register: HashMap<String, Arc<RegisterScript>>,
    causal: HashMap<String, Arc<CausalScenario>>,
    concurrency: HashMap<String, Arc<ConcurrencyScenario>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The built-in scenario tables: the canonical register script, the
    /// three causal scenarios, and the 2PL-vs-SSI write conflict.
    pub fn with_defaults() -> Result<Self, ScenarioError> {
        Self::builder()
            .register_script(linearizability::single_register())
            .causal(causal::normal())
            .causal(causal::delay())
            .causal(causal::failure())
            .concurrency(concurrency::write_conflict())
            .build()
    }

    pub fn register_script(&self, name: &str) -> Result<Arc<RegisterScript>, ScenarioError> {
        self.register
            .get(name)
            .cloned()
            .ok_or_else(|| ScenarioError::UnknownScenario {
                kind: "register",
                name: name.to_owned(),
            })
    }

    pub fn causal(&self, name: &str) -> Result<Arc<CausalScenario>, ScenarioError> {
        self.causal
            .get(name)
            .cloned()
            .ok_or_else(|| ScenarioError::UnknownScenario {
                kind: "causal",
                name: name.to_owned(),
            })
    }

    pub fn concurrency(&self, name: &str) -> Result<Arc<ConcurrencyScenario>, ScenarioError> {
        self.concurrency
            .get(name)
            .cloned()
            .ok_or_else(|| ScenarioError::UnknownScenario {
                kind: "concurrency",
                name: name.to_owned(),
            })
    }
}

/// Collects scenario tables, validating everything on [`build`].
///
/// [`build`]: RegistryBuilder::build
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    register: Vec<RegisterScript>,
    causal: Vec<CausalScenario>,
    concurrency: Vec<ConcurrencyScenario>,
}

impl RegistryBuilder {
    pub fn register_script(mut self, script: RegisterScript) -> Self {
        self.register.push(script);
        self
    }

    pub fn causal(mut self, scenario: CausalScenario) -> Self {
        self.causal.push(scenario);
        self
    }

    pub fn concurrency(mut self, scenario: ConcurrencyScenario) -> Self {
        self.concurrency.push(scenario);
        self
    }

    pub fn build(self) -> Result<Registry, ScenarioError> {
        let mut registry = Registry::default();

        for script in self.register {
            validate_register(&script)?;
            insert(
                &mut registry.register,
                "register",
                script.name.clone(),
                script,
            )?;
        }

        for scenario in self.causal {
            validate_causal(&scenario)?;
            insert(
                &mut registry.causal,
                "causal",
                scenario.name.clone(),
                scenario,
            )?;
        }

        for scenario in self.concurrency {
            validate_concurrency(&scenario)?;
            insert(
                &mut registry.concurrency,
                "concurrency",
                scenario.name.clone(),
                scenario,
            )?;
        }

        Ok(registry)
    }
}

fn insert<T>(
    map: &mut HashMap<String, Arc<T>>,
    kind: &'static str,
    name: String,
    value: T,
) -> Result<(), ScenarioError> {
    if map.contains_key(&name) {
        return Err(ScenarioError::DuplicateScenario { kind, name });
    }
    map.insert(name, Arc::new(value));
    Ok(())
}

fn validate_register(script: &RegisterScript) -> Result<(), ScenarioError> {
    if script.total_duration == 0 {
        return Err(ScenarioError::ZeroDuration {
            name: script.name.clone(),
        });
    }
    if script.ops.is_empty() {
        return Err(ScenarioError::EmptyScript {
            kind: "register",
            name: script.name.clone(),
        });
    }
    for op in &script.ops {
        if op.start_time >= script.total_duration {
            return Err(ScenarioError::OpOutOfRange {
                name: script.name.clone(),
                start_time: op.start_time,
                total_duration: script.total_duration,
            });
        }
        if op.kind == OpKind::Read && op.value.is_some() {
            return Err(ScenarioError::ValueOnRead {
                name: script.name.clone(),
                start_time: op.start_time,
            });
        }
    }
    Ok(())
}

fn validate_causal(scenario: &CausalScenario) -> Result<(), ScenarioError> {
    if scenario.steps.is_empty() {
        return Err(ScenarioError::EmptyScript {
            kind: "causal",
            name: scenario.name.clone(),
        });
    }
    for (index, step) in scenario.steps.iter().enumerate() {
        if !scenario.board.contains(step.node, &step.event) {
            return Err(ScenarioError::UnknownEvent {
                name: scenario.name.clone(),
                index,
                node: step.node,
                event: step.event.clone(),
            });
        }
    }
    Ok(())
}

fn validate_concurrency(scenario: &ConcurrencyScenario) -> Result<(), ScenarioError> {
    if scenario.snapshots.is_empty() {
        return Err(ScenarioError::EmptyScript {
            kind: "concurrency",
            name: scenario.name.clone(),
        });
    }
    for (index, snapshot) in scenario.snapshots.iter().enumerate() {
        let locked_ssi = snapshot
            .ssi
            .iter()
            .flat_map(|tx| tx.steps.iter())
            .any(|step| step.locked);
        if locked_ssi {
            return Err(ScenarioError::LockedSsiRow {
                name: scenario.name.clone(),
                index,
            });
        }
    }
    Ok(())
}
