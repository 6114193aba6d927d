//! Test fixtures and helpers.
//!
//! Common chain shapes for integration tests.

use chaincount_core::{NodeId, Topology};

/// Names for a chain of `n` nodes: `A`..`Z`, then `N26`, `N27`, ...
pub fn lettered_names(n: usize) -> Vec<NodeId> {
    (0..n)
        .map(|i| {
            if i < 26 {
                NodeId::new(((b'A' + i as u8) as char).to_string())
            } else {
                NodeId::new(format!("N{}", i))
            }
        })
        .collect()
}

/// A lettered chain of `n` nodes with the initiator at `initiator`
/// (zero-based from the left end).
///
/// Panics if `n == 0` or `initiator >= n`.
pub fn lettered_chain(n: usize, initiator: usize) -> Topology {
    let names = lettered_names(n);
    let start = names[initiator].clone();
    Topology::linear(names, start).expect("lettered names are unique")
}

/// The same chain once for every possible initiator, left to right.
pub fn every_initiator(n: usize) -> Vec<Topology> {
    (0..n).map(|i| lettered_chain(n, i)).collect()
}

/// The six-node bus `nodeA -- ... -- nodeF` started from `nodeC`.
pub fn six_node_bus() -> Topology {
    let names = ["nodeA", "nodeB", "nodeC", "nodeD", "nodeE", "nodeF"];
    Topology::linear(names, "nodeC").expect("fixed names are unique")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lettered_names() {
        let names = lettered_names(28);
        assert_eq!(names[0].as_str(), "A");
        assert_eq!(names[25].as_str(), "Z");
        assert_eq!(names[26].as_str(), "N26");
        assert_eq!(names[27].as_str(), "N27");
    }

    #[test]
    fn test_every_initiator() {
        let chains = every_initiator(4);
        assert_eq!(chains.len(), 4);
        for (i, topo) in chains.iter().enumerate() {
            assert_eq!(topo.initiator_position(), i);
            assert_eq!(topo.len(), 4);
        }
    }

    #[test]
    fn test_six_node_bus() {
        let topo = six_node_bus();
        assert_eq!(topo.len(), 6);
        assert_eq!(topo.initiator().as_str(), "nodeC");
        assert_eq!(topo.initiator_position(), 2);
    }
}
