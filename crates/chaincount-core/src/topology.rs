//! Chain topology: building and validating the wiring before a run.
//!
//! The protocol assumes a single unbranched line with exactly one
//! initiator. Nothing in the handlers can detect a broken wiring, so it
//! is rejected here instead.

use std::collections::{HashMap, HashSet};

use crate::error::TopologyError;
use crate::node::NodeState;
use crate::protocol::NodeProtocol;
use crate::types::{NodeId, Side};

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// A validated linear chain, stored left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    nodes: Vec<NodeState>,
    initiator: usize,
}

impl Topology {
    /// Build a chain from names listed left to right.
    pub fn linear<I, N>(names: I, initiator: impl Into<NodeId>) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        let ids: Vec<NodeId> = names.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(TopologyError::Empty);
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id) {
                return Err(TopologyError::DuplicateNode(id.clone()));
            }
        }

        let initiator = initiator.into();
        let position = ids
            .iter()
            .position(|id| *id == initiator)
            .ok_or(TopologyError::UnknownNode(initiator))?;

        let nodes = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let left = i.checked_sub(1).map(|l| ids[l].clone());
                let right = ids.get(i + 1).cloned();
                let mut state = NodeState::new(id.clone(), left, right);
                state.is_initiator = i == position;
                state
            })
            .collect();

        Ok(Self {
            nodes,
            initiator: position,
        })
    }

    /// Validate arbitrary per-node wiring and order it into a chain.
    ///
    /// Checks, in order: non-empty, unique ids, exactly one initiator,
    /// every neighbor exists and links back, a single left end, and a
    /// rightward walk from it that visits every node once.
    pub fn from_wiring(nodes: Vec<NodeState>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(TopologyError::Empty);
        }

        let mut by_id: HashMap<&NodeId, &NodeState> = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            if by_id.insert(&node.id, node).is_some() {
                return Err(TopologyError::DuplicateNode(node.id.clone()));
            }
        }

        let mut initiators = nodes.iter().filter(|n| n.is_initiator);
        let initiator = initiators.next().ok_or(TopologyError::NoInitiator)?;
        if let Some(second) = initiators.next() {
            return Err(TopologyError::MultipleInitiators(
                initiator.id.clone(),
                second.id.clone(),
            ));
        }

        for node in &nodes {
            for side in [Side::Left, Side::Right] {
                let Some(neighbor_id) = node.neighbor(side) else {
                    continue;
                };
                let neighbor = by_id.get(neighbor_id).ok_or_else(|| {
                    TopologyError::UnknownNeighbor {
                        node: node.id.clone(),
                        side,
                        neighbor: neighbor_id.clone(),
                    }
                })?;
                if neighbor.neighbor(side.opposite()) != Some(&node.id) {
                    return Err(TopologyError::AsymmetricLink {
                        node: node.id.clone(),
                        side,
                        neighbor: neighbor_id.clone(),
                    });
                }
            }
        }

        let mut left_ends = nodes.iter().filter(|n| n.is_left_end());
        let left_end = left_ends.next().ok_or(TopologyError::NoLeftEnd)?;
        if let Some(other) = left_ends.next() {
            return Err(TopologyError::MultipleLeftEnds(
                left_end.id.clone(),
                other.id.clone(),
            ));
        }

        let mut ordered = Vec::with_capacity(nodes.len());
        let mut current = Some(left_end);
        while let Some(node) = current {
            if ordered.len() == nodes.len() {
                break;
            }
            ordered.push(node.clone());
            current = node.right.as_ref().and_then(|id| by_id.get(id).copied());
        }

        // Symmetric links plus one left end rule out revisits on the
        // walk, but a separate ring can still hang off the side.
        if ordered.len() != nodes.len() || ordered.last().is_some_and(|n| !n.is_right_end()) {
            return Err(TopologyError::Disconnected {
                reached: ordered.len(),
                total: nodes.len(),
            });
        }

        let initiator = ordered
            .iter()
            .position(|n| n.is_initiator)
            .ok_or(TopologyError::NoInitiator)?;

        Ok(Self {
            nodes: ordered,
            initiator,
        })
    }

    /// The same chain with a different initiator, ready for a fresh run.
    pub fn with_initiator(&self, id: &NodeId) -> Result<Self> {
        let position = self
            .position(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.clone()))?;

        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let mut state = NodeState::new(n.id.clone(), n.left.clone(), n.right.clone());
                state.is_initiator = i == position;
                state
            })
            .collect();

        Ok(Self {
            nodes,
            initiator: position,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: an empty chain is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes, left to right.
    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    /// Node ids, left to right.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    /// The initiator's id.
    pub fn initiator(&self) -> &NodeId {
        &self.nodes[self.initiator].id
    }

    /// Zero-based position of the initiator from the left end.
    pub fn initiator_position(&self) -> usize {
        self.initiator
    }

    /// Zero-based position of a node from the left end.
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| &n.id == id)
    }

    /// Look up a node by id.
    pub fn get(&self, id: &NodeId) -> Option<&NodeState> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Fresh protocol instances for every node, left to right.
    pub fn protocols(&self) -> Vec<NodeProtocol> {
        self.nodes.iter().cloned().map(NodeProtocol::new).collect()
    }
}
