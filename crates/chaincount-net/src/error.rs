//! Error types for the network runtime.

use thiserror::Error;

use chaincount_core::{NodeId, ProtocolError};

/// Errors that can occur while hosting nodes or running a wave.
#[derive(Debug, Error)]
pub enum NetError {
    /// A node's protocol handler failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A handler failed on a node other than the one being driven.
    #[error("node {node} failed: {source}")]
    Fault {
        node: NodeId,
        #[source]
        source: ProtocolError,
    },

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// Frame carries a protocol version we do not speak.
    #[error("protocol version mismatch: local={local}, peer={peer}")]
    VersionMismatch { local: u8, peer: u8 },

    /// No node with this id is registered.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The wave did not terminate in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// A node task stopped before answering, or its mailbox was closed.
    #[error("node channel closed: {0}")]
    ChannelClosed(NodeId),
}

/// Result type for network operations.
pub type Result<T> = std::result::Result<T, NetError>;
