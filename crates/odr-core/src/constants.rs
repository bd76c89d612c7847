//! Protocol constants and the frame type enum.

use crate::error::PacketError;

/// Link-layer protocol id carried in every frame header (and used to filter
/// frames at the socket).
pub const PROTOCOL_ID: u16 = 61375;

/// Length of a hardware (MAC) address.
pub const HWADDR_LEN: usize = 6;

/// Width of a null-padded dotted-quad address field.
pub const ADDR_FIELD_LEN: usize = 20;

/// Width of a null-padded short hostname.
pub const HOSTNAME_LEN: usize = 10;

/// Frame header: dest MAC(6) + src MAC(6) + protocol id(2) + frame type(2).
pub const FRAME_HEADER_LEN: usize = 2 * HWADDR_LEN + 2 + 2;

/// Total frame length on the wire (a 128-byte Ethernet frame minus the FCS).
pub const FRAME_LEN: usize = 124;

/// Fixed payload region following the header.
pub const FRAME_PAYLOAD_LEN: usize = FRAME_LEN - FRAME_HEADER_LEN; // 108

/// Meaningful prefix of a route packet: dst(20) + src(20) + flags(1) +
/// reserved(3) + hopcnt(4) + bcast_id(4).
pub const ROUTE_PACKET_LEN: usize = 2 * ADDR_FIELD_LEN + 4 + 4 + 4; // 52

/// Application packet header: dst(20) + dst_port(4) + src(20) + src_port(4) +
/// length(4) + hopcnt(4) + flags(1) + reserved(3).
pub const APP_HEADER_LEN: usize = 2 * ADDR_FIELD_LEN + 4 * 4 + 4; // 60

/// Application data capacity left in the payload region.
pub const APP_DATA_CAPACITY: usize = FRAME_PAYLOAD_LEN - APP_HEADER_LEN; // 48

/// Local IPC datagram: addr(20) + port(4) + flag(4) + data.
pub const DATAGRAM_HEADER_LEN: usize = ADDR_FIELD_LEN + 4 + 4;

/// Total local IPC datagram length.
pub const DATAGRAM_LEN: usize = DATAGRAM_HEADER_LEN + APP_DATA_CAPACITY; // 76

/// Frame kinds carried in the header's type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FrameType {
    RouteRequest = 0,
    RouteReply = 1,
    AppMessage = 2,
    RouteDebug = 3,
    DataDebug = 9,
}

impl FrameType {
    pub fn from_u16(v: u16) -> Result<Self, PacketError> {
        match v {
            0 => Ok(FrameType::RouteRequest),
            1 => Ok(FrameType::RouteReply),
            2 => Ok(FrameType::AppMessage),
            3 => Ok(FrameType::RouteDebug),
            9 => Ok(FrameType::DataDebug),
            other => Err(PacketError::UnknownFrameType(other)),
        }
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }
}
