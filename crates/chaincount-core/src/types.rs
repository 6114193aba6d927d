//! Strong type definitions for chaincount.
//!
//! Node names and directions are newtypes/enums so a left neighbor can
//! never be confused with a right one at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a node in a chain (its name or address).
///
/// Unique per chain. Cloning is cheap enough for the small names used
/// in practice; nothing in the protocol depends on the contents.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identity from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One side of a node, used both for "which neighbor" and for the
/// direction a message travels (`Side::Right` = travelling rightward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The other side.
    pub const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// A single delivered message: one traversal from a node to its
/// immediate neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    /// Sending node.
    pub from: NodeId,
    /// Receiving node.
    pub to: NodeId,
    /// Direction of travel.
    pub direction: Side,
    /// The running count carried by the token.
    pub value: u64,
}

impl Hop {
    /// Create a hop record.
    pub fn new(from: NodeId, to: NodeId, direction: Side, value: u64) -> Self {
        Self {
            from,
            to,
            direction,
            value,
        }
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            Side::Left => "<-",
            Side::Right => "->",
        };
        match self.direction {
            Side::Right => write!(f, "{} {} {} ({})", self.from, arrow, self.to, self.value),
            Side::Left => write!(f, "{} {} {} ({})", self.to, arrow, self.from, self.value),
        }
    }
}
