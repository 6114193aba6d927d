//! # chaincount
//!
//! Count the nodes of a linear chain from any node in it.
//!
//! ## Overview
//!
//! Each node only knows whether it has a left and a right neighbor and
//! can pass a single integer to either. Starting at any node, a token
//! makes two passes over the chain and arrives back at the start
//! carrying the number of nodes:
//!
//! - **Pass 1**: rightward from the initiator, +1 per node, to the right end
//! - **Return**: leftward to the left end, value unchanged
//! - **Pass 2**: rightward from the left end, +1 per node, until it
//!   reaches the initiator again
//!
//! ## Usage
//!
//! ```rust
//! use chaincount::{Counter, Topology};
//!
//! let topology = Topology::linear(["A", "B", "C", "D", "E", "F"], "C").unwrap();
//! let report = Counter::default().count_local(&topology).unwrap();
//! assert_eq!(report.count, 6);
//! ```
//!
//! ## Re-exports
//!
//! - `chaincount::core` - Node state, protocol, topology
//! - `chaincount::net` - Actor-per-node runtime and transport

pub mod counter;
pub mod error;
pub mod local;

// Re-export component crates
pub use chaincount_core as core;
pub use chaincount_net as net;

// Re-export main types for convenience
pub use counter::{CountReport, Counter, CounterConfig, Runtime};
pub use error::{CountError, Result};
pub use local::LocalChain;

// Re-export commonly used core types
pub use chaincount_core::{
    Hop, NeighborLink, NodeId, NodeProtocol, NodeState, Outbox, Outcome, Phase, ProtocolError,
    Side, Topology, TopologyError,
};
