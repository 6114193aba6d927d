//! # chaincount core
//!
//! Pure primitives for counting the nodes of a linear chain: node state,
//! the wave/echo counting protocol, and chain topology.
//!
//! This crate contains no I/O, no threads, no networking. Runtimes that
//! host nodes and carry their messages live in `chaincount-net` and the
//! `chaincount` facade.
//!
//! ## Key Types
//!
//! - [`NodeProtocol`] - Per-node state machine with the two receive handlers
//! - [`NeighborLink`] - The messaging capability a node needs from its host
//! - [`Outbox`] - A buffered link that delivers after the handler returns
//! - [`Topology`] - A validated, left-to-right chain with one initiator
//!
//! ## Example
//!
//! ```rust
//! use chaincount_core::{NodeProtocol, NodeState, Outbox, Outcome};
//!
//! let mut lone = NodeProtocol::new(NodeState::new("A", None, None).initiator());
//! let mut outbox = Outbox::for_node(lone.state());
//! assert_eq!(lone.start(&mut outbox).unwrap(), Outcome::Terminated(1));
//! ```

pub mod error;
pub mod node;
pub mod protocol;
pub mod topology;
pub mod types;

pub use error::{ProtocolError, Result, TopologyError};
pub use node::{NodeState, Phase};
pub use protocol::{NeighborLink, NodeProtocol, Outbox, Outcome, Outgoing};
pub use topology::Topology;
pub use types::{Hop, NodeId, Side};
