//! In-process chain runtime.
//!
//! Every node lives in one registry and messages wait in a FIFO queue
//! until the previous handler has returned. Runs are deterministic: the
//! same topology always yields the same trace.

use std::collections::{HashMap, VecDeque};

use chaincount_core::{
    Hop, NodeId, NodeProtocol, Outbox, Outcome, Outgoing, ProtocolError, Topology, TopologyError,
};

use crate::counter::CountReport;
use crate::error::{CountError, Result};

/// A chain of nodes driven on the caller's thread.
#[derive(Debug)]
pub struct LocalChain {
    nodes: HashMap<NodeId, NodeProtocol>,
    len: usize,
    initiator: NodeId,
    queue: VecDeque<Hop>,
    max_hops: usize,
    record_trace: bool,
    peak_in_flight: usize,
}

impl LocalChain {
    /// Load a chain. The hop budget defaults to `2 * (n - 1)`, the exact
    /// number of messages a correct run sends.
    pub fn new(topology: &Topology) -> Self {
        let nodes = topology
            .protocols()
            .into_iter()
            .map(|p| (p.id().clone(), p))
            .collect();

        Self {
            nodes,
            len: topology.len(),
            initiator: topology.initiator().clone(),
            queue: VecDeque::new(),
            max_hops: 2 * topology.len().saturating_sub(1),
            record_trace: true,
            peak_in_flight: 0,
        }
    }

    /// Override the hop budget.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Keep or drop the per-hop trace.
    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    /// Start the wave at the initiator and deliver until it terminates.
    pub fn run(&mut self) -> Result<CountReport> {
        tracing::info!(initiator = %self.initiator, nodes = self.len, "starting wave");

        let initiator = self.initiator.clone();
        let protocol = self.node_mut(&initiator)?;
        let mut outbox = Outbox::for_node(protocol.state());
        let mut outcome = protocol.start(&mut outbox)?;
        self.enqueue(&initiator, outbox.drain())?;

        let mut hops = Vec::new();
        let mut messages = 0usize;

        let count = loop {
            if let Outcome::Terminated(count) = outcome {
                break count;
            }
            let hop = self
                .queue
                .pop_front()
                .ok_or(CountError::NotTerminated { messages })?;

            messages += 1;
            if messages > self.max_hops {
                return Err(CountError::HopLimitExceeded {
                    limit: self.max_hops,
                });
            }

            outcome = self.deliver(&hop)?;
            if self.record_trace {
                hops.push(hop);
            }
        };

        tracing::info!(initiator = %self.initiator, count, messages, "wave complete");

        Ok(CountReport {
            initiator,
            count,
            hops,
            messages,
        })
    }

    /// The count held by a node, if any.
    pub fn result(&self, id: &NodeId) -> Option<u64> {
        self.nodes.get(id).and_then(NodeProtocol::result)
    }

    /// Look up a node's protocol state.
    pub fn node(&self, id: &NodeId) -> Option<&NodeProtocol> {
        self.nodes.get(id)
    }

    /// Most messages that were ever waiting at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }

    fn deliver(&mut self, hop: &Hop) -> Result<Outcome> {
        let receiver = self.node_mut(&hop.to)?;
        let mut outbox = Outbox::for_node(receiver.state());
        let outcome = receiver.receive(hop.direction.opposite(), hop.value, &mut outbox)?;
        self.enqueue(&hop.to, outbox.drain())?;
        Ok(outcome)
    }

    fn enqueue(&mut self, from: &NodeId, sent: Vec<Outgoing>) -> Result<()> {
        let state = self
            .nodes
            .get(from)
            .ok_or_else(|| TopologyError::UnknownNode(from.clone()))?
            .state();

        for out in sent {
            let to = state
                .neighbor(out.side)
                .cloned()
                .ok_or_else(|| ProtocolError::InvalidTopology {
                    node: from.clone(),
                    side: out.side,
                })?;
            self.queue
                .push_back(Hop::new(from.clone(), to, out.side, out.value));
        }
        self.peak_in_flight = self.peak_in_flight.max(self.queue.len());
        Ok(())
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut NodeProtocol> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.clone()).into())
    }
}
