//! # chaincount testkit
//!
//! Testing utilities for chaincount.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden traces**: Fixed chains with the exact hop sequence of their wave
//! - **Generators**: Proptest strategies for chains and initiator positions
//! - **Fixtures**: Helpers for building lettered chains
//!
//! ## Golden Traces
//!
//! ```rust
//! use chaincount_testkit::vectors::{all_vectors, run_vector};
//!
//! for vector in all_vectors() {
//!     let report = run_vector(&vector);
//!     assert!(vector.matches(&report), "{}", vector.name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use chaincount::LocalChain;
//! use chaincount_testkit::generators::{topology_from_params, ChainParams};
//!
//! proptest! {
//!     #[test]
//!     fn counts_every_chain(params: ChainParams) {
//!         let report = LocalChain::new(&topology_from_params(&params)).run().unwrap();
//!         prop_assert_eq!(report.count, params.len as u64);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use chaincount_testkit::fixtures::lettered_chain;
//!
//! let topology = lettered_chain(6, 2);
//! assert_eq!(topology.initiator().as_str(), "C");
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{every_initiator, lettered_chain, lettered_names, six_node_bus};
pub use generators::{random_topology, topology_from_params, ChainParams};
pub use vectors::{all_vectors, run_vector, verify_all_vectors, GoldenTrace};
