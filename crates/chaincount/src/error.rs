//! Error types for the counter.

use chaincount_core::{ProtocolError, TopologyError};
use chaincount_net::NetError;
use thiserror::Error;

/// Errors that can occur while counting a chain.
#[derive(Debug, Error)]
pub enum CountError {
    /// The chain wiring is invalid.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// A node's protocol handler failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The network runtime failed.
    #[error("network error: {0}")]
    Net(#[from] NetError),

    /// More messages were sent than a correct run can produce.
    #[error("hop limit of {limit} exceeded")]
    HopLimitExceeded { limit: usize },

    /// No message is in flight but the initiator has no count.
    #[error("wave stalled after {messages} messages without terminating")]
    NotTerminated { messages: usize },
}

/// Result type for counting operations.
pub type Result<T> = std::result::Result<T, CountError>;
