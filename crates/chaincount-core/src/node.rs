//! Per-node state.
//!
//! A `NodeState` is owned by exactly one execution context (a runtime
//! slot or an actor task). Other nodes never touch it directly; every
//! cross-node effect goes through a [`NeighborLink`](crate::NeighborLink).

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Side};

/// Where a node is in the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing has happened on this node yet.
    Idle,
    /// The initiator has emitted the first message and waits for the wave.
    Sent,
    /// A non-initiator has forwarded at least one message.
    Relaying,
    /// The initiator has recorded the count.
    Done,
}

/// Identity, wiring and result of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// This node's identity.
    pub id: NodeId,
    /// Left neighbor, `None` at the left end.
    pub left: Option<NodeId>,
    /// Right neighbor, `None` at the right end.
    pub right: Option<NodeId>,
    /// True on exactly one node per run.
    pub is_initiator: bool,
    /// The count, only ever set on the initiator once the wave terminates.
    pub result: Option<u64>,
}

impl NodeState {
    /// Create a wired, non-initiator node.
    pub fn new(id: impl Into<NodeId>, left: Option<NodeId>, right: Option<NodeId>) -> Self {
        Self {
            id: id.into(),
            left,
            right,
            is_initiator: false,
            result: None,
        }
    }

    /// Mark this node as the initiator.
    pub fn initiator(mut self) -> Self {
        self.is_initiator = true;
        self
    }

    /// The neighbor on the given side, if any.
    pub fn neighbor(&self, side: Side) -> Option<&NodeId> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    /// True if this node has no left neighbor.
    pub fn is_left_end(&self) -> bool {
        self.left.is_none()
    }

    /// True if this node has no right neighbor.
    pub fn is_right_end(&self) -> bool {
        self.right.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_lookup() {
        let node = NodeState::new("B", Some("A".into()), Some("C".into()));
        assert_eq!(node.neighbor(Side::Left), Some(&NodeId::new("A")));
        assert_eq!(node.neighbor(Side::Right), Some(&NodeId::new("C")));
        assert!(!node.is_left_end());
        assert!(!node.is_right_end());
        assert!(!node.is_initiator);
        assert_eq!(node.result, None);
    }

    #[test]
    fn test_ends() {
        let left_end = NodeState::new("A", None, Some("B".into())).initiator();
        assert!(left_end.is_left_end());
        assert!(left_end.is_initiator);

        let lone = NodeState::new("A", None, None);
        assert!(lone.is_left_end() && lone.is_right_end());
    }
}
