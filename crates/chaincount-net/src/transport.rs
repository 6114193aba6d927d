//! Transport abstraction for neighbor links.
//!
//! The transport moves wave frames between named nodes. Implementations
//! must deliver frames between any two nodes in send order.

use async_trait::async_trait;

use chaincount_core::NodeId;

use crate::error::Result;
use crate::messages::WaveFrame;

/// Transport trait for sending and receiving wave frames.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a frame to a specific node.
    async fn send(&self, peer: &NodeId, frame: WaveFrame) -> Result<()>;

    /// Receive the next frame from any node.
    ///
    /// Returns the sender's NodeId and the frame.
    /// Blocks until a frame is available or an error occurs.
    ///
    /// Fails with `ChannelClosed` once the node is detached from the network.
    async fn recv(&self) -> Result<(NodeId, WaveFrame)>;
}

/// A simple in-memory transport.
///
/// Uses one bounded channel per node as its mailbox. Frames are encoded
/// on send and decoded on receive, like a real wire.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use bytes::Bytes;
    use tokio::sync::{mpsc, RwLock};

    use crate::error::NetError;

    /// Message envelope for internal routing.
    #[derive(Debug, Clone)]
    struct Envelope {
        from: NodeId,
        payload: Bytes,
    }

    /// Registry of node mailboxes.
    pub struct MemoryNetwork {
        /// Sender channels for each node.
        senders: RwLock<HashMap<NodeId, mpsc::Sender<Envelope>>>,
    }

    impl MemoryNetwork {
        /// Create a new memory network.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Register a node and return its transport endpoint.
        ///
        /// Registering an id again replaces the previous mailbox.
        pub async fn create_transport(
            self: &Arc<Self>,
            node_id: NodeId,
            capacity: usize,
        ) -> MemoryTransport {
            let (tx, rx) = mpsc::channel(capacity.max(1));

            self.senders.write().await.insert(node_id.clone(), tx);

            MemoryTransport {
                node_id,
                network: Arc::clone(self),
                receiver: RwLock::new(rx),
            }
        }

        /// Unregister a node. Frames sent to it afterwards fail.
        pub async fn remove(&self, node_id: &NodeId) -> bool {
            self.senders.write().await.remove(node_id).is_some()
        }

        /// Number of registered nodes.
        pub async fn len(&self) -> usize {
            self.senders.read().await.len()
        }

        /// True if no node is registered.
        pub async fn is_empty(&self) -> bool {
            self.senders.read().await.is_empty()
        }
    }

    impl Default for MemoryNetwork {
        fn default() -> Self {
            Self {
                senders: RwLock::new(HashMap::new()),
            }
        }
    }

    /// In-memory transport implementation.
    pub struct MemoryTransport {
        node_id: NodeId,
        network: Arc<MemoryNetwork>,
        receiver: RwLock<mpsc::Receiver<Envelope>>,
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&self, peer: &NodeId, frame: WaveFrame) -> Result<()> {
            let payload = frame.encode()?;
            let sender = {
                let senders = self.network.senders.read().await;
                senders
                    .get(peer)
                    .cloned()
                    .ok_or_else(|| NetError::NodeNotFound(peer.clone()))?
            };
            let envelope = Envelope {
                from: self.node_id.clone(),
                payload,
            };
            sender
                .send(envelope)
                .await
                .map_err(|_| NetError::Transport(format!("node {} disconnected", peer)))
        }

        async fn recv(&self) -> Result<(NodeId, WaveFrame)> {
            let mut rx = self.receiver.write().await;
            match rx.recv().await {
                Some(envelope) => Ok((envelope.from, WaveFrame::decode(&envelope.payload)?)),
                None => Err(NetError::ChannelClosed(self.node_id.clone())),
            }
        }
    }
}
