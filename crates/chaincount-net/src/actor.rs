//! Node actors: one task per node, owning that node's protocol state.
//!
//! An actor reacts to two inputs: frames from its neighbors (via the
//! transport) and commands from the driver (start, snapshot, shutdown).
//! Each input is handled to completion before the next one is read, so
//! a node's handlers never interleave.

use tokio::sync::{mpsc, oneshot};

use chaincount_core::{Hop, NodeId, NodeProtocol, NodeState, Outbox, Outcome, Phase, ProtocolError};

use crate::error::{NetError, Result};
use crate::messages::WaveFrame;
use crate::transport::Transport;

/// Driver-to-node commands.
#[derive(Debug)]
pub enum Command {
    /// Start the wave on this node; the reply fires when it terminates.
    Start { reply: oneshot::Sender<Result<u64>> },
    /// Report the node's current state.
    Snapshot { reply: oneshot::Sender<NodeSnapshot> },
    /// Stop the actor.
    Shutdown,
}

/// Node-to-driver notifications.
#[derive(Debug)]
pub enum RunEvent {
    /// A frame reached its neighbor.
    Hop(Hop),
    /// A node failed; the run cannot complete.
    Fault(NetError),
}

/// Point-in-time view of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub state: NodeState,
    pub phase: Phase,
}

/// A node hosted as an independent task.
pub struct NodeActor<T: Transport> {
    protocol: NodeProtocol,
    transport: T,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<RunEvent>,
    /// Pending completion for a started initiator.
    completion: Option<oneshot::Sender<Result<u64>>>,
}

impl<T: Transport> NodeActor<T> {
    /// Create an actor for a wired node.
    pub fn new(
        protocol: NodeProtocol,
        transport: T,
        commands: mpsc::Receiver<Command>,
        events: mpsc::UnboundedSender<RunEvent>,
    ) -> Self {
        Self {
            protocol,
            transport,
            commands,
            events,
            completion: None,
        }
    }

    /// Run until shut down or the driver goes away.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                frame = self.transport.recv() => match frame {
                    Ok((from, frame)) => self.handle_frame(from, frame).await,
                    // Detached from the network: whoever sends here next sees the fault.
                    Err(NetError::ChannelClosed(_)) if self.completion.is_none() => {
                        tracing::debug!(node = %self.protocol.id(), "mailbox closed");
                        break;
                    }
                    Err(e) => {
                        self.fail(e);
                        break;
                    }
                },
            }
        }
        tracing::debug!(node = %self.protocol.id(), "node actor stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let mut outbox = Outbox::for_node(self.protocol.state());
                match self.protocol.start(&mut outbox) {
                    Ok(Outcome::Terminated(count)) => {
                        let _ = reply.send(Ok(count));
                    }
                    Ok(Outcome::Forwarded(_)) => {
                        self.completion = Some(reply);
                        if let Err(e) = self.flush(outbox).await {
                            self.fail(e);
                        }
                    }
                    Err(e) => {
                        let _ = reply.send(Err(NetError::Protocol(e)));
                    }
                }
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(NodeSnapshot {
                    state: self.protocol.state().clone(),
                    phase: self.protocol.phase(),
                });
            }
            Command::Shutdown => {}
        }
    }

    async fn handle_frame(&mut self, from: NodeId, frame: WaveFrame) {
        let side = frame.arrived_from();
        if self.protocol.state().neighbor(side) != Some(&from) {
            self.fail(NetError::Transport(format!(
                "node {} got a frame from {}, which is not its {} neighbor",
                self.protocol.id(),
                from,
                side
            )));
            return;
        }
        let hop = Hop::new(from, self.protocol.id().clone(), frame.direction, frame.value);
        let _ = self.events.send(RunEvent::Hop(hop));

        let mut outbox = Outbox::for_node(self.protocol.state());
        match self.protocol.receive(side, frame.value, &mut outbox) {
            Ok(Outcome::Terminated(count)) => {
                if let Some(reply) = self.completion.take() {
                    let _ = reply.send(Ok(count));
                }
            }
            Ok(Outcome::Forwarded(_)) => {
                if let Err(e) = self.flush(outbox).await {
                    self.fail(e);
                }
            }
            Err(source) => self.fail(NetError::Fault {
                node: self.protocol.id().clone(),
                source,
            }),
        }
    }

    /// Deliver everything the handler sent, in order.
    async fn flush(&self, mut outbox: Outbox) -> Result<()> {
        let from = self.protocol.id();
        for out in outbox.drain() {
            let neighbor = self.protocol.state().neighbor(out.side).ok_or_else(|| {
                ProtocolError::InvalidTopology {
                    node: from.clone(),
                    side: out.side,
                }
            })?;
            self.transport
                .send(neighbor, WaveFrame::new(from.clone(), out.side, out.value))
                .await?;
        }
        Ok(())
    }

    fn fail(&mut self, err: NetError) {
        tracing::warn!(node = %self.protocol.id(), error = %err, "node failed");
        match self.completion.take() {
            Some(reply) => {
                let _ = reply.send(Err(err));
            }
            None => {
                let _ = self.events.send(RunEvent::Fault(err));
            }
        }
    }
}
