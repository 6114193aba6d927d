//! # chaincount net
//!
//! Hosts every node of a chain as its own task and carries the wave
//! between them as encoded frames.
//!
//! ## Overview
//!
//! Each node is a [`NodeActor`] owning its `NodeProtocol`. Actors find
//! their neighbors through an explicit registry ([`MemoryNetwork`]) and
//! exchange [`WaveFrame`]s over per-node FIFO mailboxes. The driver
//! ([`ChainNetwork`]) starts the initiator and waits on a completion
//! channel, so a caller only sees the count after the whole wave has
//! terminated.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chaincount_core::Topology;
//! use chaincount_net::{ChainNetwork, RunConfig};
//!
//! async fn example() {
//!     let topology = Topology::linear(["A", "B", "C", "D", "E", "F"], "C").unwrap();
//!     let mut chain = ChainNetwork::spawn(&topology, RunConfig::default()).await;
//!     let report = chain.run().await.unwrap();
//!     assert_eq!(report.count, 6);
//!     chain.shutdown().await;
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! driver        C            D  ..  F          A  ..  B
//!   |-- Start ->|            |      |          |      |
//!   |           |-- 1 ------>|-- .. |          |      |
//!   |           |<---------- | <-- turn        |      |
//!   |           |-- return --------------------> turn |
//!   |           |<------------------------------------|
//!   |<- count --|
//! ```

pub mod actor;
pub mod error;
pub mod messages;
pub mod network;
pub mod transport;

pub use actor::{Command, NodeActor, NodeSnapshot, RunEvent};
pub use error::{NetError, Result};
pub use messages::{WaveFrame, PROTOCOL_VERSION};
pub use network::{ChainNetwork, RunConfig, RunReport};
pub use transport::{memory::MemoryNetwork, memory::MemoryTransport, Transport};
