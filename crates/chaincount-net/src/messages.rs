//! Wire frames exchanged between neighboring nodes.
//!
//! A frame carries one wave value across one link. Frames are CBOR on
//! the wire so a transport can move them as opaque bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use chaincount_core::{NodeId, Side};

use crate::error::{NetError, Result};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 0;

/// One hop of the wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveFrame {
    /// Protocol version for compatibility checking.
    pub version: u8,
    /// The sending node.
    pub from: NodeId,
    /// Direction of travel (`Right` means the receiver's left neighbor sent it).
    pub direction: Side,
    /// The running count.
    pub value: u64,
}

impl WaveFrame {
    /// Create a frame at the current protocol version.
    pub fn new(from: NodeId, direction: Side, value: u64) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            from,
            direction,
            value,
        }
    }

    /// The receiver's side the frame came in on.
    pub fn arrived_from(&self) -> Side {
        self.direction.opposite()
    }

    /// Encode to CBOR.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| NetError::Codec(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    /// Decode from CBOR, rejecting frames from another protocol version.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let frame: Self =
            ciborium::from_reader(bytes).map_err(|e| NetError::Codec(e.to_string()))?;
        if frame.version != PROTOCOL_VERSION {
            return Err(NetError::VersionMismatch {
                local: PROTOCOL_VERSION,
                peer: frame.version,
            });
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_arrival_side() {
        let frame = WaveFrame::new("A".into(), Side::Right, 1);
        assert_eq!(frame.arrived_from(), Side::Left);

        let frame = WaveFrame::new("C".into(), Side::Left, 4);
        assert_eq!(frame.arrived_from(), Side::Right);
    }

    #[test]
    fn test_frame_decodes_what_it_encodes() {
        let frame = WaveFrame::new("nodeC".into(), Side::Left, 42);
        let bytes = frame.encode().unwrap();
        assert_eq!(WaveFrame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_frame_version_mismatch() {
        let mut frame = WaveFrame::new("A".into(), Side::Right, 1);
        frame.version = PROTOCOL_VERSION + 1;
        let bytes = frame.encode().unwrap();
        assert!(matches!(
            WaveFrame::decode(&bytes),
            Err(NetError::VersionMismatch { peer: 1, .. })
        ));
    }

    #[test]
    fn test_frame_garbage_rejected() {
        assert!(matches!(
            WaveFrame::decode(&[0xff, 0x00, 0x13]),
            Err(NetError::Codec(_))
        ));
    }
}
