//! The counting protocol state machine.
//!
//! A single token travels the chain carrying a running count. It leaves
//! the initiator rightward, turns around at the right end, runs back
//! unchanged to the left end, turns around again and counts its way back
//! to the initiator:
//!
//! ```text
//!   A -- B -- C -- D -- E -- F        initiator = C
//!
//!             C -1-> D -2-> E -3-> F   pass 1: +1 on every hop
//!   A <-4- B <-4- C <-4- D <-4- E <-4- F   return: unchanged
//!   A -5-> B -6-> C                    pass 2: +1 on every hop
//!                 C.result = 6
//! ```
//!
//! Increments happen in exactly two places: on entry to
//! `on_receive_from_left` at a non-initiator, and at the left end in
//! `on_receive_from_right`. The initiator intercepts only in
//! `on_receive_from_left`; on the return pass it relays like any other
//! node. Making that check symmetric stops the second pass early and
//! breaks the count.

use crate::error::{ProtocolError, Result};
use crate::node::{NodeState, Phase};
use crate::types::{NodeId, Side};

/// Messaging capability a node needs from its environment.
///
/// Implementations must deliver `send_to_left(v)` to the left neighbor's
/// `on_receive_from_right(v)` (and symmetrically), in send order.
pub trait NeighborLink {
    /// True if a left neighbor exists.
    fn has_left(&self) -> bool;

    /// True if a right neighbor exists.
    fn has_right(&self) -> bool;

    /// Deliver `value` to the left neighbor.
    fn send_to_left(&mut self, value: u64) -> Result<()>;

    /// Deliver `value` to the right neighbor.
    fn send_to_right(&mut self, value: u64) -> Result<()>;
}

/// A message emitted by a handler, not yet delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outgoing {
    /// Which neighbor receives it (also the direction of travel).
    pub side: Side,
    /// The carried count.
    pub value: u64,
}

/// Buffered [`NeighborLink`] that records sends instead of performing them.
///
/// Runtimes give each handler invocation an outbox and deliver its
/// contents once the handler has returned, so a handler never runs
/// while another handler on the same node is on the stack.
#[derive(Debug, Clone)]
pub struct Outbox {
    node: NodeId,
    has_left: bool,
    has_right: bool,
    pending: Vec<Outgoing>,
}

impl Outbox {
    /// Create an empty outbox matching a node's wiring.
    pub fn for_node(state: &NodeState) -> Self {
        Self {
            node: state.id.clone(),
            has_left: state.left.is_some(),
            has_right: state.right.is_some(),
            pending: Vec::new(),
        }
    }

    /// Remove and return everything sent so far, in send order.
    pub fn drain(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.pending)
    }

    /// True if nothing has been sent.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl NeighborLink for Outbox {
    fn has_left(&self) -> bool {
        self.has_left
    }

    fn has_right(&self) -> bool {
        self.has_right
    }

    fn send_to_left(&mut self, value: u64) -> Result<()> {
        if !self.has_left {
            return Err(ProtocolError::InvalidTopology {
                node: self.node.clone(),
                side: Side::Left,
            });
        }
        self.pending.push(Outgoing {
            side: Side::Left,
            value,
        });
        Ok(())
    }

    fn send_to_right(&mut self, value: u64) -> Result<()> {
        if !self.has_right {
            return Err(ProtocolError::InvalidTopology {
                node: self.node.clone(),
                side: Side::Right,
            });
        }
        self.pending.push(Outgoing {
            side: Side::Right,
            value,
        });
        Ok(())
    }
}

/// What a single protocol step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A message was handed to the link towards this side.
    Forwarded(Side),
    /// The wave ended here; the initiator now holds the count.
    Terminated(u64),
}

impl Outcome {
    /// The count, if this step terminated the wave.
    pub fn count(self) -> Option<u64> {
        match self {
            Outcome::Terminated(count) => Some(count),
            Outcome::Forwarded(_) => None,
        }
    }
}

/// The per-node protocol: state plus the handlers that act on it.
#[derive(Debug, Clone)]
pub struct NodeProtocol {
    state: NodeState,
    phase: Phase,
}

impl NodeProtocol {
    /// Wrap a wired node.
    pub fn new(state: NodeState) -> Self {
        Self {
            state,
            phase: Phase::Idle,
        }
    }

    /// This node's identity.
    pub fn id(&self) -> &NodeId {
        &self.state.id
    }

    /// Read-only view of the node state.
    pub fn state(&self) -> &NodeState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True if this node is the initiator.
    pub fn is_initiator(&self) -> bool {
        self.state.is_initiator
    }

    /// The count. `Some` only on the initiator after termination.
    pub fn result(&self) -> Option<u64> {
        self.state.result
    }

    /// Start a run. Only valid once, on the initiator.
    ///
    /// The initiator counts itself, so the first value sent is `1`.
    /// An initiator at the right end sends that value leftward: it is
    /// already the turnaround point. A lone node records `1` and sends
    /// nothing.
    pub fn start<L: NeighborLink>(&mut self, link: &mut L) -> Result<Outcome> {
        if !self.state.is_initiator {
            return Err(ProtocolError::NotInitiator(self.state.id.clone()));
        }
        if self.phase != Phase::Idle {
            return Err(ProtocolError::AlreadyStarted(self.state.id.clone()));
        }
        self.trace("start", 1);

        if link.has_right() {
            self.send_right(1, link)?;
            self.phase = Phase::Sent;
            Ok(Outcome::Forwarded(Side::Right))
        } else if link.has_left() {
            self.send_left(1, link)?;
            self.phase = Phase::Sent;
            Ok(Outcome::Forwarded(Side::Left))
        } else {
            Ok(self.terminate(1))
        }
    }

    /// Handle a message from the left neighbor (travelling rightward).
    pub fn on_receive_from_left<L: NeighborLink>(
        &mut self,
        value: u64,
        link: &mut L,
    ) -> Result<Outcome> {
        self.trace("receive_from_left", value);

        if self.state.is_initiator {
            if self.phase != Phase::Sent {
                return Err(self.unexpected(Side::Left));
            }
            return Ok(self.terminate(value));
        }

        let value = self.count_hop(value)?;
        self.phase = Phase::Relaying;

        if link.has_right() {
            self.send_right(value, link)?;
            Ok(Outcome::Forwarded(Side::Right))
        } else {
            // Right end: already counted on entry, turn around as is.
            self.send_left(value, link)?;
            Ok(Outcome::Forwarded(Side::Left))
        }
    }

    /// Handle a message from the right neighbor (travelling leftward).
    ///
    /// The pass-through branch does not look at the initiator flag.
    pub fn on_receive_from_right<L: NeighborLink>(
        &mut self,
        value: u64,
        link: &mut L,
    ) -> Result<Outcome> {
        self.trace("receive_from_right", value);

        if self.state.is_initiator && self.phase != Phase::Sent {
            return Err(self.unexpected(Side::Right));
        }
        if !self.state.is_initiator {
            self.phase = Phase::Relaying;
        }

        if link.has_left() {
            self.send_left(value, link)?;
            return Ok(Outcome::Forwarded(Side::Left));
        }

        // Left end. An initiator here has seen the wave cross every node
        // to its right and back; nothing is left to count.
        if self.state.is_initiator {
            return Ok(self.terminate(value));
        }

        let value = self.count_hop(value)?;
        self.send_right(value, link)?;
        Ok(Outcome::Forwarded(Side::Right))
    }

    /// Dispatch a message that arrived from `from` to the matching handler.
    pub fn receive<L: NeighborLink>(
        &mut self,
        from: Side,
        value: u64,
        link: &mut L,
    ) -> Result<Outcome> {
        match from {
            Side::Left => self.on_receive_from_left(value, link),
            Side::Right => self.on_receive_from_right(value, link),
        }
    }

    /// Send `value` to the left neighbor.
    pub fn send_left<L: NeighborLink>(&self, value: u64, link: &mut L) -> Result<()> {
        if !link.has_left() {
            return Err(ProtocolError::InvalidTopology {
                node: self.state.id.clone(),
                side: Side::Left,
            });
        }
        link.send_to_left(value)
    }

    /// Send `value` to the right neighbor.
    pub fn send_right<L: NeighborLink>(&self, value: u64, link: &mut L) -> Result<()> {
        if !link.has_right() {
            return Err(ProtocolError::InvalidTopology {
                node: self.state.id.clone(),
                side: Side::Right,
            });
        }
        link.send_to_right(value)
    }

    fn terminate(&mut self, count: u64) -> Outcome {
        self.state.result = Some(count);
        self.phase = Phase::Done;
        tracing::info!(node = %self.state.id, count, "wave terminated");
        Outcome::Terminated(count)
    }

    fn count_hop(&self, value: u64) -> Result<u64> {
        value
            .checked_add(1)
            .ok_or_else(|| ProtocolError::CountOverflow(self.state.id.clone()))
    }

    fn unexpected(&self, side: Side) -> ProtocolError {
        ProtocolError::UnexpectedMessage {
            node: self.state.id.clone(),
            side,
            phase: self.phase,
        }
    }

    fn trace(&self, operation: &str, value: u64) {
        tracing::debug!(
            node = %self.state.id,
            operation,
            value,
            phase = ?self.phase,
            initiator = self.state.is_initiator,
            "protocol step"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(id: &str, left: Option<&str>, right: Option<&str>) -> NodeProtocol {
        NodeProtocol::new(NodeState::new(
            id,
            left.map(NodeId::from),
            right.map(NodeId::from),
        ))
    }

    fn initiator(id: &str, left: Option<&str>, right: Option<&str>) -> NodeProtocol {
        NodeProtocol::new(
            NodeState::new(id, left.map(NodeId::from), right.map(NodeId::from)).initiator(),
        )
    }

    fn outbox(p: &NodeProtocol) -> Outbox {
        Outbox::for_node(p.state())
    }

    /// Run one handler and return what it sent.
    fn step(p: &mut NodeProtocol, from: Side, value: u64) -> (Outcome, Vec<Outgoing>) {
        let mut out = outbox(p);
        let outcome = p.receive(from, value, &mut out).unwrap();
        (outcome, out.drain())
    }

    fn sent(side: Side, value: u64) -> Vec<Outgoing> {
        vec![Outgoing { side, value }]
    }

    #[test]
    fn test_single_node_counts_itself() {
        // Chosen policy for a chain of one: count 1, send nothing.
        let mut a = initiator("A", None, None);
        let mut out = outbox(&a);
        assert_eq!(a.start(&mut out).unwrap(), Outcome::Terminated(1));
        assert!(out.is_empty());
        assert_eq!(a.result(), Some(1));
        assert_eq!(a.phase(), Phase::Done);
    }

    #[test]
    fn test_two_nodes_initiator_left() {
        let mut a = initiator("A", None, Some("B"));
        let mut b = node("B", Some("A"), None);

        let mut out = outbox(&a);
        a.start(&mut out).unwrap();
        assert_eq!(out.drain(), sent(Side::Right, 1));

        // B is the right end: count and turn around.
        let (_, msgs) = step(&mut b, Side::Left, 1);
        assert_eq!(msgs, sent(Side::Left, 2));

        // Back at the leftmost initiator: done.
        let (outcome, msgs) = step(&mut a, Side::Right, 2);
        assert_eq!(outcome, Outcome::Terminated(2));
        assert!(msgs.is_empty());
        assert_eq!(a.result(), Some(2));
        assert_eq!(b.result(), None);
    }

    #[test]
    fn test_two_nodes_initiator_right() {
        let mut a = node("A", None, Some("B"));
        let mut b = initiator("B", Some("A"), None);

        let mut out = outbox(&b);
        assert_eq!(b.start(&mut out).unwrap(), Outcome::Forwarded(Side::Left));
        assert_eq!(out.drain(), sent(Side::Left, 1));

        let (_, msgs) = step(&mut a, Side::Right, 1);
        assert_eq!(msgs, sent(Side::Right, 2));

        let (outcome, _) = step(&mut b, Side::Left, 2);
        assert_eq!(outcome, Outcome::Terminated(2));
    }

    #[test]
    fn test_three_nodes_initiator_middle() {
        let mut a = node("A", None, Some("B"));
        let mut b = initiator("B", Some("A"), Some("C"));
        let mut c = node("C", Some("B"), None);

        let mut out = outbox(&b);
        b.start(&mut out).unwrap();
        assert_eq!(out.drain(), sent(Side::Right, 1));

        let (_, msgs) = step(&mut c, Side::Left, 1);
        assert_eq!(msgs, sent(Side::Left, 2));

        // The initiator relays on the return pass without counting.
        let (outcome, msgs) = step(&mut b, Side::Right, 2);
        assert_eq!(outcome, Outcome::Forwarded(Side::Left));
        assert_eq!(msgs, sent(Side::Left, 2));
        assert_eq!(b.result(), None);

        let (_, msgs) = step(&mut a, Side::Right, 2);
        assert_eq!(msgs, sent(Side::Right, 3));

        let (outcome, _) = step(&mut b, Side::Left, 3);
        assert_eq!(outcome, Outcome::Terminated(3));
    }

    #[test]
    fn test_relay_increments_only_from_left() {
        let mut b = node("B", Some("A"), Some("C"));

        let (_, msgs) = step(&mut b, Side::Left, 4);
        assert_eq!(msgs, sent(Side::Right, 5));

        let (_, msgs) = step(&mut b, Side::Right, 4);
        assert_eq!(msgs, sent(Side::Left, 4));
        assert_eq!(b.phase(), Phase::Relaying);
    }

    #[test]
    fn test_start_on_relay_fails() {
        let mut b = node("B", Some("A"), Some("C"));
        let mut out = outbox(&b);
        assert_eq!(
            b.start(&mut out),
            Err(ProtocolError::NotInitiator(NodeId::new("B")))
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut a = initiator("A", None, Some("B"));
        let mut out = outbox(&a);
        a.start(&mut out).unwrap();
        assert_eq!(
            a.start(&mut out),
            Err(ProtocolError::AlreadyStarted(NodeId::new("A")))
        );
    }

    #[test]
    fn test_initiator_rejects_message_before_start() {
        let mut b = initiator("B", Some("A"), Some("C"));
        let mut out = outbox(&b);
        let err = b.on_receive_from_left(3, &mut out).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedMessage { side: Side::Left, .. }));
    }

    #[test]
    fn test_send_past_chain_end_fails() {
        let a = node("A", None, Some("B"));
        let mut out = outbox(&a);
        assert_eq!(
            a.send_left(1, &mut out),
            Err(ProtocolError::InvalidTopology {
                node: NodeId::new("A"),
                side: Side::Left,
            })
        );

        let c = node("C", Some("B"), None);
        let mut out = outbox(&c);
        assert!(c.send_right(1, &mut out).is_err());
        assert!(out.send_to_right(1).is_err());
    }

    proptest! {
        #[test]
        fn test_relay_rules_for_any_value(value in 1u64..u64::MAX) {
            // Interior relay: +1 rightward, unchanged leftward.
            let mut b = node("B", Some("A"), Some("C"));
            prop_assert_eq!(step(&mut b, Side::Left, value).1, sent(Side::Right, value + 1));
            prop_assert_eq!(step(&mut b, Side::Right, value).1, sent(Side::Left, value));

            // Ends turn the wave around and count themselves.
            let mut c = node("C", Some("B"), None);
            prop_assert_eq!(step(&mut c, Side::Left, value).1, sent(Side::Left, value + 1));
            let mut a = node("A", None, Some("B"));
            prop_assert_eq!(step(&mut a, Side::Right, value).1, sent(Side::Right, value + 1));
        }

        #[test]
        fn test_initiator_terminates_with_returned_value(value in 1u64..=u64::MAX) {
            let mut b = initiator("B", Some("A"), Some("C"));
            let mut out = outbox(&b);
            b.start(&mut out).unwrap();

            let (outcome, msgs) = step(&mut b, Side::Left, value);
            prop_assert_eq!(outcome, Outcome::Terminated(value));
            prop_assert!(msgs.is_empty());
            prop_assert_eq!(b.result(), Some(value));
        }
    }

    #[test]
    fn test_count_overflow() {
        let mut b = node("B", Some("A"), Some("C"));
        let mut out = outbox(&b);
        assert_eq!(
            b.on_receive_from_left(u64::MAX, &mut out),
            Err(ProtocolError::CountOverflow(NodeId::new("B")))
        );
    }
}
