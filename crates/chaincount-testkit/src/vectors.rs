//! Golden traces for deterministic verification.
//!
//! Each vector pins a chain, an initiator, the final count, and every hop
//! of the wave in order. Any change to where the count is incremented or
//! where the initiator intercepts shows up here as a trace diff.

use serde::{Deserialize, Serialize};

use chaincount::{CountReport, LocalChain};
use chaincount_core::{Hop, NodeId, Topology, TopologyError};

/// A golden trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenTrace {
    /// Human-readable name for the vector.
    pub name: String,
    /// What the vector exercises.
    pub description: String,
    /// Node names, left to right.
    pub chain: Vec<NodeId>,
    /// The initiator.
    pub initiator: NodeId,
    /// Expected count.
    pub count: u64,
    /// Expected hops, in delivery order.
    pub hops: Vec<Hop>,
}

impl GoldenTrace {
    /// Build the vector's topology.
    pub fn topology(&self) -> Result<Topology, TopologyError> {
        Topology::linear(self.chain.iter().cloned(), self.initiator.clone())
    }

    /// True if a report reproduces this vector exactly.
    pub fn matches(&self, report: &CountReport) -> bool {
        report.initiator == self.initiator && report.count == self.count && report.hops == self.hops
    }
}

const GOLDEN_TRACES: &str = r#"[
  {
    "name": "single_node",
    "description": "Lone initiator: counts itself, sends nothing (chosen policy)",
    "chain": ["A"],
    "initiator": "A",
    "count": 1,
    "hops": []
  },
  {
    "name": "two_nodes_from_left",
    "description": "Leftmost initiator terminates when the wave returns from the right",
    "chain": ["A", "B"],
    "initiator": "A",
    "count": 2,
    "hops": [
      {"from": "A", "to": "B", "direction": "Right", "value": 1},
      {"from": "B", "to": "A", "direction": "Left", "value": 2}
    ]
  },
  {
    "name": "two_nodes_from_right",
    "description": "Rightmost initiator starts leftward",
    "chain": ["A", "B"],
    "initiator": "B",
    "count": 2,
    "hops": [
      {"from": "B", "to": "A", "direction": "Left", "value": 1},
      {"from": "A", "to": "B", "direction": "Right", "value": 2}
    ]
  },
  {
    "name": "three_nodes_from_leftmost",
    "description": "Pass 1 to the right end, turnaround, return to the initiator",
    "chain": ["A", "B", "C"],
    "initiator": "A",
    "count": 3,
    "hops": [
      {"from": "A", "to": "B", "direction": "Right", "value": 1},
      {"from": "B", "to": "C", "direction": "Right", "value": 2},
      {"from": "C", "to": "B", "direction": "Left", "value": 3},
      {"from": "B", "to": "A", "direction": "Left", "value": 3}
    ]
  },
  {
    "name": "three_nodes_from_rightmost",
    "description": "Mirror of the leftmost case: return pass first, then pass 2",
    "chain": ["A", "B", "C"],
    "initiator": "C",
    "count": 3,
    "hops": [
      {"from": "C", "to": "B", "direction": "Left", "value": 1},
      {"from": "B", "to": "A", "direction": "Left", "value": 1},
      {"from": "A", "to": "B", "direction": "Right", "value": 2},
      {"from": "B", "to": "C", "direction": "Right", "value": 3}
    ]
  },
  {
    "name": "three_nodes_from_middle",
    "description": "Interior initiator relays the return pass unchanged",
    "chain": ["A", "B", "C"],
    "initiator": "B",
    "count": 3,
    "hops": [
      {"from": "B", "to": "C", "direction": "Right", "value": 1},
      {"from": "C", "to": "B", "direction": "Left", "value": 2},
      {"from": "B", "to": "A", "direction": "Left", "value": 2},
      {"from": "A", "to": "B", "direction": "Right", "value": 3}
    ]
  },
  {
    "name": "six_node_bus_from_c",
    "description": "A -- B -- C -- D -- E -- F started from C",
    "chain": ["A", "B", "C", "D", "E", "F"],
    "initiator": "C",
    "count": 6,
    "hops": [
      {"from": "C", "to": "D", "direction": "Right", "value": 1},
      {"from": "D", "to": "E", "direction": "Right", "value": 2},
      {"from": "E", "to": "F", "direction": "Right", "value": 3},
      {"from": "F", "to": "E", "direction": "Left", "value": 4},
      {"from": "E", "to": "D", "direction": "Left", "value": 4},
      {"from": "D", "to": "C", "direction": "Left", "value": 4},
      {"from": "C", "to": "B", "direction": "Left", "value": 4},
      {"from": "B", "to": "A", "direction": "Left", "value": 4},
      {"from": "A", "to": "B", "direction": "Right", "value": 5},
      {"from": "B", "to": "C", "direction": "Right", "value": 6}
    ]
  }
]"#;

/// Get all golden traces.
pub fn all_vectors() -> Vec<GoldenTrace> {
    serde_json::from_str(GOLDEN_TRACES).expect("golden traces are valid JSON")
}

/// Run a vector on the in-process runtime.
pub fn run_vector(vector: &GoldenTrace) -> CountReport {
    let topology = vector.topology().expect("golden chains are well formed");
    LocalChain::new(&topology)
        .run()
        .expect("golden chains terminate")
}

/// Verify every golden trace against the in-process runtime.
///
/// Returns `(name, matches)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool)> {
    all_vectors()
        .iter()
        .map(|v| (v.name.clone(), v.matches(&run_vector(v))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincount::{Counter, CounterConfig, Runtime};

    #[test]
    fn test_all_vectors_match() {
        for (name, matches) in verify_all_vectors() {
            assert!(matches, "golden trace '{}' does not match", name);
        }
    }

    #[test]
    fn test_vectors_count_their_chain() {
        for vector in all_vectors() {
            assert_eq!(vector.count, vector.chain.len() as u64, "{}", vector.name);
            assert_eq!(
                vector.hops.len(),
                2 * (vector.chain.len() - 1),
                "{}",
                vector.name
            );
        }
    }

    #[test]
    fn test_tampered_trace_rejected() {
        let mut vector = all_vectors()
            .into_iter()
            .find(|v| v.name == "six_node_bus_from_c")
            .unwrap();
        vector.hops[8].value += 1;
        assert!(!vector.matches(&run_vector(&vector)));
    }

    #[tokio::test]
    async fn test_network_reproduces_vectors() {
        let counter = Counter::new(CounterConfig::default().with_runtime(Runtime::Network));
        for vector in all_vectors() {
            let report = counter.count(&vector.topology().unwrap()).await.unwrap();
            assert!(vector.matches(&report), "network diverged on '{}'", vector.name);
        }
    }
}
