//! Actor-per-node chain runtime.
//!
//! Spawns one [`NodeActor`] per node of a [`Topology`], wires them
//! through a [`MemoryNetwork`], and drives a single wave from the
//! initiator to completion.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use chaincount_core::{Hop, NodeId, Topology};

use crate::actor::{Command, NodeActor, NodeSnapshot, RunEvent};
use crate::error::{NetError, Result};
use crate::transport::memory::MemoryNetwork;

/// Configuration for a network run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Upper bound on the whole wave, start to termination.
    pub wave_timeout: Duration,
    /// Capacity of each node's frame mailbox.
    pub mailbox_capacity: usize,
    /// Whether to keep every hop in the report.
    pub record_trace: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            wave_timeout: Duration::from_secs(30),
            mailbox_capacity: 16,
            record_trace: true,
        }
    }
}

/// Result of a completed wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The node the wave started and ended at.
    pub initiator: NodeId,
    /// Number of nodes in the chain, as counted by the wave.
    pub count: u64,
    /// Delivered hops in order (empty unless `record_trace`).
    pub hops: Vec<Hop>,
    /// Number of messages sent.
    pub messages: usize,
}

struct NodeHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

/// A running chain of node actors.
pub struct ChainNetwork {
    network: Arc<MemoryNetwork>,
    nodes: HashMap<NodeId, NodeHandle>,
    order: Vec<NodeId>,
    initiator: NodeId,
    events: mpsc::UnboundedReceiver<RunEvent>,
    config: RunConfig,
}

impl ChainNetwork {
    /// Spawn an actor for every node of the chain.
    pub async fn spawn(topology: &Topology, config: RunConfig) -> Self {
        let network = MemoryNetwork::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut nodes = HashMap::with_capacity(topology.len());

        for protocol in topology.protocols() {
            let id = protocol.id().clone();
            let transport = network
                .create_transport(id.clone(), config.mailbox_capacity)
                .await;
            let (commands_tx, commands_rx) = mpsc::channel(8);
            let actor = NodeActor::new(protocol, transport, commands_rx, events_tx.clone());
            let task = tokio::spawn(actor.run());
            nodes.insert(
                id,
                NodeHandle {
                    commands: commands_tx,
                    task,
                },
            );
        }

        tracing::debug!(nodes = topology.len(), initiator = %topology.initiator(), "chain spawned");

        Self {
            network,
            nodes,
            order: topology.ids().cloned().collect(),
            initiator: topology.initiator().clone(),
            events: events_rx,
            config,
        }
    }

    /// The designated initiator.
    pub fn initiator(&self) -> &NodeId {
        &self.initiator
    }

    /// Start the wave at the initiator and wait for it to terminate.
    ///
    /// Fails with the first node fault, or with `Timeout` once
    /// `wave_timeout` has elapsed.
    pub async fn run(&mut self) -> Result<RunReport> {
        tracing::info!(initiator = %self.initiator, nodes = self.order.len(), "starting wave");

        let (reply_tx, mut reply_rx) = oneshot::channel();
        self.command(&self.initiator, Command::Start { reply: reply_tx })
            .await?;

        let deadline = tokio::time::sleep(self.config.wave_timeout);
        tokio::pin!(deadline);

        let mut hops = Vec::new();
        let mut messages = 0usize;

        let count = loop {
            tokio::select! {
                biased;
                event = self.events.recv() => match event {
                    Some(RunEvent::Hop(hop)) => {
                        messages += 1;
                        if self.config.record_trace {
                            hops.push(hop);
                        }
                    }
                    Some(RunEvent::Fault(err)) => return Err(err),
                    None => return Err(NetError::Transport("event channel closed".into())),
                },
                reply = &mut reply_rx => match reply {
                    Ok(Ok(count)) => break count,
                    Ok(Err(err)) => return Err(err),
                    Err(_) => return Err(NetError::ChannelClosed(self.initiator.clone())),
                },
                _ = &mut deadline => {
                    return Err(NetError::Timeout(format!(
                        "wave from {} did not terminate within {:?}",
                        self.initiator, self.config.wave_timeout
                    )));
                }
            }
        };

        // Every hop is reported by its receiver before it acts, and the
        // initiator replies only after the last frame reached it, so all
        // of this run's hops are already queued.
        while let Ok(event) = self.events.try_recv() {
            match event {
                RunEvent::Hop(hop) => {
                    messages += 1;
                    if self.config.record_trace {
                        hops.push(hop);
                    }
                }
                RunEvent::Fault(err) => return Err(err),
            }
        }

        tracing::info!(initiator = %self.initiator, count, messages, "wave complete");

        Ok(RunReport {
            initiator: self.initiator.clone(),
            count,
            hops,
            messages,
        })
    }

    /// Current state of one node.
    pub async fn snapshot(&self, id: &NodeId) -> Result<NodeSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(id, Command::Snapshot { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| NetError::ChannelClosed(id.clone()))
    }

    /// The count held by a node (`None` until the wave has terminated
    /// there, and always on non-initiators).
    pub async fn result(&self, id: &NodeId) -> Result<Option<u64>> {
        Ok(self.snapshot(id).await?.state.result)
    }

    /// Drop a node from the transport registry, cutting both its links.
    pub async fn disconnect(&self, id: &NodeId) -> Result<()> {
        if self.network.remove(id).await {
            Ok(())
        } else {
            Err(NetError::NodeNotFound(id.clone()))
        }
    }

    /// Stop every actor, left to right, and wait for them to exit.
    pub async fn shutdown(mut self) {
        for id in &self.order {
            let Some(handle) = self.nodes.remove(id) else {
                continue;
            };
            if handle.commands.send(Command::Shutdown).await.is_err() {
                tracing::debug!(node = %id, "node already stopped");
            }
            let _ = handle.task.await;
        }
    }

    async fn command(&self, id: &NodeId, command: Command) -> Result<()> {
        let handle = self
            .nodes
            .get(id)
            .ok_or_else(|| NetError::NodeNotFound(id.clone()))?;
        handle
            .commands
            .send(command)
            .await
            .map_err(|_| NetError::ChannelClosed(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincount_core::{Phase, ProtocolError, Side};

    fn lettered(n: usize) -> Vec<String> {
        (0..n).map(|i| ((b'A' + i as u8) as char).to_string()).collect()
    }

    async fn count(n: usize, initiator: usize) -> RunReport {
        let names = lettered(n);
        let topo = Topology::linear(names.clone(), names[initiator].as_str()).unwrap();
        let mut chain = ChainNetwork::spawn(&topo, RunConfig::default()).await;
        let report = chain.run().await.unwrap();
        chain.shutdown().await;
        report
    }

    #[tokio::test]
    async fn test_six_nodes_from_c() {
        let report = count(6, 2).await;
        assert_eq!(report.count, 6);
        assert_eq!(report.initiator, NodeId::new("C"));
        assert_eq!(report.messages, 10);
        assert_eq!(report.hops.len(), 10);

        let first = &report.hops[0];
        assert_eq!((first.from.as_str(), first.to.as_str()), ("C", "D"));
        let last = report.hops.last().unwrap();
        assert_eq!((last.from.as_str(), last.to.as_str(), last.value), ("B", "C", 6));
    }

    #[tokio::test]
    async fn test_every_position_small_chains() {
        for n in 1..=5 {
            for i in 0..n {
                let report = count(n, i).await;
                assert_eq!(report.count, n as u64, "n={} initiator={}", n, i);
                assert_eq!(report.messages, 2 * (n - 1));
            }
        }
    }

    #[tokio::test]
    async fn test_result_only_on_initiator() {
        let topo = Topology::linear(["A", "B", "C"], "B").unwrap();
        let mut chain = ChainNetwork::spawn(&topo, RunConfig::default()).await;

        assert_eq!(chain.result(&"B".into()).await.unwrap(), None);
        chain.run().await.unwrap();

        assert_eq!(chain.result(&"B".into()).await.unwrap(), Some(3));
        assert_eq!(chain.result(&"A".into()).await.unwrap(), None);
        assert_eq!(chain.result(&"C".into()).await.unwrap(), None);

        let snapshot = chain.snapshot(&"B".into()).await.unwrap();
        assert_eq!(snapshot.phase, Phase::Done);
        chain.shutdown().await;
    }

    #[tokio::test]
    async fn test_second_run_rejected() {
        let topo = Topology::linear(["A", "B"], "A").unwrap();
        let mut chain = ChainNetwork::spawn(&topo, RunConfig::default()).await;
        chain.run().await.unwrap();

        let err = chain.run().await.unwrap_err();
        assert!(matches!(
            err,
            NetError::Protocol(ProtocolError::AlreadyStarted(_))
        ));
        chain.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_neighbor_is_fatal() {
        let topo = Topology::linear(["A", "B", "C", "D"], "B").unwrap();
        let mut chain = ChainNetwork::spawn(&topo, RunConfig::default()).await;
        chain.disconnect(&"D".into()).await.unwrap();

        let err = chain.run().await.unwrap_err();
        assert!(
            matches!(&err, NetError::NodeNotFound(id) if id.as_str() == "D"),
            "unexpected error: {err}"
        );
        assert!(matches!(
            chain.disconnect(&"D".into()).await,
            Err(NetError::NodeNotFound(_))
        ));
        chain.shutdown().await;
    }

    #[tokio::test]
    async fn test_stalled_node_times_out() {
        let topo = Topology::linear(["A", "B", "C", "D"], "B").unwrap();
        let config = RunConfig {
            wave_timeout: Duration::from_millis(50),
            ..RunConfig::default()
        };
        let mut chain = ChainNetwork::spawn(&topo, config).await;

        // Replace D's actor with a mailbox nobody drains.
        let stalled = NodeId::new("D");
        let handle = chain.nodes.remove(&stalled).unwrap();
        handle.commands.send(Command::Shutdown).await.unwrap();
        handle.task.await.unwrap();
        let _mailbox = chain.network.create_transport(stalled, 1).await;

        let err = chain.run().await.unwrap_err();
        assert!(matches!(err, NetError::Timeout(_)), "unexpected error: {err}");
        assert_eq!(chain.result(&"B".into()).await.unwrap(), None);
        chain.shutdown().await;
    }

    #[tokio::test]
    async fn test_trace_can_be_skipped() {
        let topo = Topology::linear(["A", "B", "C"], "C").unwrap();
        let config = RunConfig {
            record_trace: false,
            ..RunConfig::default()
        };
        let mut chain = ChainNetwork::spawn(&topo, config).await;
        let report = chain.run().await.unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.messages, 4);
        assert!(report.hops.is_empty());
        chain.shutdown().await;
    }

    #[tokio::test]
    async fn test_rightmost_initiator_trace() {
        let report = count(3, 2).await;
        let trace: Vec<(&str, &str, Side, u64)> = report
            .hops
            .iter()
            .map(|h| (h.from.as_str(), h.to.as_str(), h.direction, h.value))
            .collect();
        assert_eq!(
            trace,
            vec![
                ("C", "B", Side::Left, 1),
                ("B", "A", Side::Left, 1),
                ("A", "B", Side::Right, 2),
                ("B", "C", Side::Right, 3),
            ]
        );
    }
}
