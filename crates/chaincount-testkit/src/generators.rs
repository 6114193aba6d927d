//! Proptest generators for property-based testing.

use proptest::prelude::*;
use rand::Rng;

use chaincount_core::Topology;

use crate::fixtures::lettered_chain;

/// Longest chain the generators produce.
pub const MAX_CHAIN_LEN: usize = 48;

/// Generate a chain length.
pub fn chain_len() -> impl Strategy<Value = usize> {
    1usize..=MAX_CHAIN_LEN
}

/// Parameters for generating a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    /// Number of nodes.
    pub len: usize,
    /// Initiator position, zero-based from the left end.
    pub initiator: usize,
}

impl Arbitrary for ChainParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        chain_len()
            .prop_flat_map(|len| (Just(len), 0..len))
            .prop_map(|(len, initiator)| ChainParams { len, initiator })
            .boxed()
    }
}

/// Build the chain described by the parameters.
pub fn topology_from_params(params: &ChainParams) -> Topology {
    lettered_chain(params.len, params.initiator)
}

/// A lettered chain of `len` nodes with a randomly placed initiator.
pub fn random_topology<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Topology {
    lettered_chain(len, rng.gen_range(0..len))
}
