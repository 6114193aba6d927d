//! Error types for chaincount core.

use thiserror::Error;

use crate::node::Phase;
use crate::types::{NodeId, Side};

/// Errors raised by the counting protocol itself.
///
/// All of these abort the run. None is retryable: re-sending a wave
/// value could count a node twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A send was attempted towards a neighbor that does not exist.
    #[error("node {node} has no {side} neighbor to send to")]
    InvalidTopology { node: NodeId, side: Side },

    /// `start()` was called on a node that is not the initiator.
    #[error("node {0} is not the initiator")]
    NotInitiator(NodeId),

    /// `start()` was called twice on the same initiator.
    #[error("protocol already started on node {0}")]
    AlreadyStarted(NodeId),

    /// A message arrived that no correct run can produce at this point.
    #[error("unexpected message from {side} at node {node} in phase {phase:?}")]
    UnexpectedMessage {
        node: NodeId,
        side: Side,
        phase: Phase,
    },

    /// The running count no longer fits in a `u64`.
    #[error("count overflow at node {0}")]
    CountOverflow(NodeId),
}

/// Errors detected while wiring a chain, before any run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("chain has no nodes")]
    Empty,

    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("chain has no initiator")]
    NoInitiator,

    #[error("chain has more than one initiator: {0} and {1}")]
    MultipleInitiators(NodeId, NodeId),

    #[error("node {node} references unknown {side} neighbor {neighbor}")]
    UnknownNeighbor {
        node: NodeId,
        side: Side,
        neighbor: NodeId,
    },

    #[error("link between {node} and its {side} neighbor {neighbor} is not mirrored")]
    AsymmetricLink {
        node: NodeId,
        side: Side,
        neighbor: NodeId,
    },

    #[error("chain has no leftmost node (cycle)")]
    NoLeftEnd,

    #[error("chain has more than one leftmost node: {0} and {1}")]
    MultipleLeftEnds(NodeId, NodeId),

    #[error("chain is not connected: reached {reached} of {total} nodes")]
    Disconnected { reached: usize, total: usize },

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
