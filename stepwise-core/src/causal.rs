//! Scripted event replay across three nodes.
//!
//! A [`CausalScenario`] is an ordered list of [`Step`]s over a fixed
//! [`Board`] of per-node events. [`Replay`] walks the script one step per
//! tick, marking events active and flagging the ones the author declared
//! out of order.
//!
//! The engine does not compute causal violations itself; that would need
//! vector clocks or Lamport timestamps carried on messages. It renders the
//! script's annotations.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum NodeId {
    A,
    B,
    C,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::A => write!(f, "A"),
            NodeId::B => write!(f, "B"),
            NodeId::C => write!(f, "C"),
        }
    }
}

/// One event slot on a node, fixed at authoring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub text: String,
}

impl EventDef {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// The per-node event lists a scenario replays against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    pub nodes: BTreeMap<NodeId, Vec<EventDef>>,
}

impl Board {
    pub fn node(mut self, id: NodeId, events: Vec<EventDef>) -> Self {
        self.nodes.insert(id, events);
        self
    }

    pub fn contains(&self, node: NodeId, event: &str) -> bool {
        self.nodes
            .get(&node)
            .map(|events| events.iter().any(|e| e.id == event))
            .unwrap_or(false)
    }
}

/// An inter-node message, alive only while its step is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: NodeId,
    pub to: NodeId,
}

/// One scripted step of a causal scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub node: NodeId,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default)]
    pub out_of_order: bool,
    pub explanation: String,
}

impl Step {
    pub fn new(node: NodeId, event: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            node,
            event: event.into(),
            message: None,
            out_of_order: false,
            explanation: explanation.into(),
        }
    }

    pub fn message(mut self, from: NodeId, to: NodeId) -> Self {
        self.message = Some(Message { from, to });
        self
    }

    pub fn out_of_order(mut self) -> Self {
        self.out_of_order = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalScenario {
    pub name: String,
    pub description: String,
    pub board: Board,
    pub steps: Vec<Step>,
}

/// The canonical three-node board shared by the built-in scenarios.
pub fn canonical_board() -> Board {
    Board::default()
        .node(
            NodeId::A,
            vec![
                EventDef::new("A1", "A sends message to B"),
                EventDef::new("A2", "A receives ack from B"),
                EventDef::new("A3", "A processes data"),
            ],
        )
        .node(
            NodeId::B,
            vec![
                EventDef::new("B1", "B receives message from A"),
                EventDef::new("B2", "B sends ack to A"),
                EventDef::new("B3", "B sends message to C"),
            ],
        )
        .node(
            NodeId::C,
            vec![
                EventDef::new("C1", "C receives message from B"),
                EventDef::new("C2", "C updates database"),
                EventDef::new("C3", "C sends result to A"),
            ],
        )
}

/// Typical message passing with no anomalies.
pub fn normal() -> CausalScenario {
    CausalScenario {
        name: "normal".to_owned(),
        description:
            "Demonstrates typical message passing and processing in a distributed system."
                .to_owned(),
        board: canonical_board(),
        steps: vec![
            Step::new(
                NodeId::A,
                "A1",
                "Node A initiates the process by sending a message to Node B.",
            )
            .message(NodeId::A, NodeId::B),
            Step::new(NodeId::B, "B1", "Node B receives the message from Node A."),
            Step::new(
                NodeId::B,
                "B2",
                "Node B acknowledges receipt by sending a message back to Node A.",
            )
            .message(NodeId::B, NodeId::A),
            Step::new(
                NodeId::A,
                "A2",
                "Node A receives the acknowledgment from Node B.",
            ),
            Step::new(
                NodeId::B,
                "B3",
                "Node B sends a message to Node C to continue the process.",
            )
            .message(NodeId::B, NodeId::C),
            Step::new(NodeId::C, "C1", "Node C receives the message from Node B."),
            Step::new(
                NodeId::C,
                "C2",
                "Node C processes the received information and updates its database.",
            ),
            Step::new(NodeId::C, "C3", "Node C sends the result back to Node A.")
                .message(NodeId::C, NodeId::A),
            Step::new(
                NodeId::A,
                "A3",
                "Node A receives the result from Node C and processes the data.",
            ),
        ],
    }
}

/// A delayed acknowledgment reorders events on two nodes.
pub fn delay() -> CausalScenario {
    CausalScenario {
        name: "delay".to_owned(),
        description: "Shows how network delays can affect the order of events. \
                      Watch for out-of-order events."
            .to_owned(),
        board: canonical_board(),
        steps: vec![
            Step::new(NodeId::A, "A1", "Node A sends a message to Node B.")
                .message(NodeId::A, NodeId::B),
            Step::new(NodeId::B, "B1", "Node B receives the message from Node A."),
            Step::new(
                NodeId::B,
                "B2",
                "Node B sends an acknowledgment back to Node A, but there's a network delay.",
            )
            .message(NodeId::B, NodeId::A),
            Step::new(
                NodeId::B,
                "B3",
                "Due to the delay, Node B sends a message to Node C before A has received \
                 the acknowledgment. This is out of the expected order.",
            )
            .message(NodeId::B, NodeId::C)
            .out_of_order(),
            Step::new(NodeId::C, "C1", "Node C receives the message from Node B."),
            Step::new(
                NodeId::C,
                "C2",
                "Node C processes the information and updates its database.",
            ),
            Step::new(
                NodeId::A,
                "A2",
                "Node A finally receives the delayed acknowledgment from Node B. \
                 This event is out of order due to the network delay.",
            )
            .out_of_order(),
            Step::new(NodeId::C, "C3", "Node C sends the result back to Node A.")
                .message(NodeId::C, NodeId::A),
            Step::new(
                NodeId::A,
                "A3",
                "Node A receives the result from Node C and processes the data.",
            ),
        ],
    }
}

/// Node C fails and the rest of the system proceeds without it.
pub fn failure() -> CausalScenario {
    CausalScenario {
        name: "failure".to_owned(),
        description: "Illustrates how a node failure affects the system. Node C fails, \
                      causing a disruption in the expected event order."
            .to_owned(),
        board: canonical_board(),
        steps: vec![
            Step::new(
                NodeId::A,
                "A1",
                "Node A initiates the process by sending a message to Node B.",
            )
            .message(NodeId::A, NodeId::B),
            Step::new(NodeId::B, "B1", "Node B receives the message from Node A."),
            Step::new(
                NodeId::B,
                "B2",
                "Node B acknowledges receipt by sending a message back to Node A.",
            )
            .message(NodeId::B, NodeId::A),
            Step::new(
                NodeId::A,
                "A2",
                "Node A receives the acknowledgment from Node B.",
            ),
            Step::new(
                NodeId::B,
                "B3",
                "Node B attempts to send a message to Node C, but C has failed.",
            )
            .message(NodeId::B, NodeId::C),
            Step::new(
                NodeId::A,
                "A3",
                "After a timeout, Node A proceeds with processing, assuming Node C has \
                 failed. This event is out of order because it occurs without input from \
                 Node C.",
            )
            .out_of_order(),
        ],
    }
}

/// Replay-time state of one event slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventState {
    pub id: String,
    pub text: String,
    /// The event has occurred so far in this replay.
    pub active: bool,
    /// The event is its node's most recent occurrence.
    pub current: bool,
    pub out_of_order: bool,
}

/// Per-tick payload for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalFrame {
    pub step_index: i64,
    pub nodes: BTreeMap<NodeId, Vec<EventState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Forward-only walk through a causal scenario.
///
/// `step_index` starts at the before-first-step sentinel of -1 and only
/// moves forward; random access would let replays skip the flag updates
/// earlier steps apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    scenario: Arc<CausalScenario>,
    step_index: i64,
    nodes: BTreeMap<NodeId, Vec<EventState>>,
    active_message: Option<Message>,
}

impl Replay {
    pub fn new(scenario: Arc<CausalScenario>) -> Self {
        let nodes = initial_nodes(&scenario.board);
        Self {
            scenario,
            step_index: -1,
            nodes,
            active_message: None,
        }
    }

    pub fn scenario(&self) -> &Arc<CausalScenario> {
        &self.scenario
    }

    pub fn step_index(&self) -> i64 {
        self.step_index
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Vec<EventState>> {
        &self.nodes
    }

    pub fn active_message(&self) -> Option<Message> {
        self.active_message
    }

    /// The last scripted step has been applied.
    pub fn is_complete(&self) -> bool {
        self.step_index + 1 >= self.scenario.steps.len() as i64
    }

    /// Apply the next scripted step.
    ///
    /// Marks the step's event active and current, copies the script's
    /// out-of-order annotation, and clears `current` on the other events of
    /// that node only; highlights on other nodes persist until those nodes
    /// fire again. The step's message (or its absence) replaces the single
    /// active message.
    ///
    /// Returns `false` without changing state when the replay is complete.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }

        self.step_index += 1;
        let step = &self.scenario.steps[self.step_index as usize];

        if let Some(events) = self.nodes.get_mut(&step.node) {
            for event in events.iter_mut() {
                if event.id == step.event {
                    event.active = true;
                    event.current = true;
                    event.out_of_order = step.out_of_order;
                } else {
                    event.current = false;
                }
            }
        }

        self.active_message = step.message;
        true
    }

    /// Return every event to its initial flags and the cursor to -1.
    pub fn reset(&mut self) {
        self.step_index = -1;
        self.active_message = None;
        self.nodes = initial_nodes(&self.scenario.board);
    }

    pub fn frame(&self) -> CausalFrame {
        let explanation = if self.step_index >= 0 {
            Some(
                self.scenario.steps[self.step_index as usize]
                    .explanation
                    .clone(),
            )
        } else {
            None
        };

        CausalFrame {
            step_index: self.step_index,
            nodes: self.nodes.clone(),
            active_message: self.active_message,
            explanation,
        }
    }
}

fn initial_nodes(board: &Board) -> BTreeMap<NodeId, Vec<EventState>> {
    board
        .nodes
        .iter()
        .map(|(id, events)| {
            let events = events
                .iter()
                .map(|e| EventState {
                    id: e.id.clone(),
                    text: e.text.clone(),
                    active: false,
                    current: false,
                    out_of_order: false,
                })
                .collect();
            (*id, events)
        })
        .collect()
}
