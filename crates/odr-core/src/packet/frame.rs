//! Link-layer frame wire format.
//!
//! ```text
//! dest MAC(6) | src MAC(6) | protocol id(u16 BE) | frame type(u16 BE) | payload(108)
//! ```

use crate::constants::{
    FRAME_HEADER_LEN, FRAME_LEN, FRAME_PAYLOAD_LEN, FrameType, HWADDR_LEN, PROTOCOL_ID,
};
use crate::error::PacketError;
use crate::field::{read_str_field, write_str_field};
use crate::packet::app::AppPacket;
use crate::packet::route::RoutePacket;
use crate::types::HwAddr;

/// A parsed frame with an owned, fixed-size payload region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub dest: HwAddr,
    pub source: HwAddr,
    pub frame_type: FrameType,
    pub payload: [u8; FRAME_PAYLOAD_LEN],
}

impl Frame {
    /// Build a frame around an already-encoded payload.
    pub fn new(
        dest: HwAddr,
        source: HwAddr,
        frame_type: FrameType,
        payload: [u8; FRAME_PAYLOAD_LEN],
    ) -> Self {
        Self {
            dest,
            source,
            frame_type,
            payload,
        }
    }

    /// Build an RREQ or RREP frame.
    pub fn route(dest: HwAddr, source: HwAddr, packet: &RoutePacket) -> Self {
        let frame_type = if packet.flags.reply {
            FrameType::RouteReply
        } else {
            FrameType::RouteRequest
        };
        Self::new(dest, source, frame_type, packet.encode())
    }

    /// Build an application message frame.
    pub fn app(dest: HwAddr, source: HwAddr, packet: &AppPacket) -> Self {
        Self::new(dest, source, FrameType::AppMessage, packet.encode())
    }

    /// Build a debug frame carrying null-terminated text (truncated to fit).
    pub fn debug(dest: HwAddr, source: HwAddr, frame_type: FrameType, text: &str) -> Self {
        let mut payload = [0u8; FRAME_PAYLOAD_LEN];
        let bytes = text.as_bytes();
        let len = bytes.len().min(FRAME_PAYLOAD_LEN - 1);
        // Cannot fail: len leaves room for the terminator.
        let _ = write_str_field(&mut payload, &bytes[..len]);
        Self::new(dest, source, frame_type, payload)
    }

    /// Parse a frame from wire bytes. Trailing bytes beyond the fixed frame
    /// length are ignored.
    pub fn parse(raw: &[u8]) -> Result<Self, PacketError> {
        if raw.len() < FRAME_LEN {
            return Err(PacketError::TooShort {
                min: FRAME_LEN,
                actual: raw.len(),
            });
        }

        let mut dest = [0u8; HWADDR_LEN];
        dest.copy_from_slice(&raw[..HWADDR_LEN]);
        let mut source = [0u8; HWADDR_LEN];
        source.copy_from_slice(&raw[HWADDR_LEN..2 * HWADDR_LEN]);
        let (dest, source) = (HwAddr::new(dest), HwAddr::new(source));

        let protocol = u16::from_be_bytes([raw[12], raw[13]]);
        if protocol != PROTOCOL_ID {
            return Err(PacketError::WrongProtocol(protocol));
        }
        let frame_type = FrameType::from_u16(u16::from_be_bytes([raw[14], raw[15]]))?;

        let mut payload = [0u8; FRAME_PAYLOAD_LEN];
        payload.copy_from_slice(&raw[FRAME_HEADER_LEN..FRAME_LEN]);

        Ok(Self {
            dest,
            source,
            frame_type,
            payload,
        })
    }

    /// Serialize to exactly `FRAME_LEN` bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_LEN);
        out.extend_from_slice(self.dest.as_ref());
        out.extend_from_slice(self.source.as_ref());
        out.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
        out.extend_from_slice(&self.frame_type.to_u16().to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decode the payload as a route packet (RREQ/RREP frames only).
    pub fn route_packet(&self) -> Result<RoutePacket, PacketError> {
        match self.frame_type {
            FrameType::RouteRequest | FrameType::RouteReply => RoutePacket::decode(&self.payload),
            other => Err(PacketError::UnexpectedFrameType(other.to_u16())),
        }
    }

    /// Decode the payload as an application packet (APPMSG frames only).
    pub fn app_packet(&self) -> Result<AppPacket, PacketError> {
        match self.frame_type {
            FrameType::AppMessage => AppPacket::decode(&self.payload),
            other => Err(PacketError::UnexpectedFrameType(other.to_u16())),
        }
    }

    /// Text carried by a debug frame, lossily decoded.
    pub fn debug_text(&self) -> String {
        String::from_utf8_lossy(read_str_field(&self.payload)).into_owned()
    }
}
