//! Route request / reply packet.
//!
//! ```text
//! dst(20) | src(20) | flags(1) | reserved(3) | hopcnt(u32 BE) | bcast_id(u32 BE)
//! ```
//!
//! The rest of the 108-byte payload region is zero padding.

use crate::constants::{ADDR_FIELD_LEN, FRAME_PAYLOAD_LEN, ROUTE_PACKET_LEN};
use crate::error::PacketError;
use crate::field::{read_addr, read_u32, write_addr, write_u32};
use crate::packet::flags::RouteFlags;
use crate::types::NodeAddr;

const DST: usize = 0;
const SRC: usize = DST + ADDR_FIELD_LEN;
const FLAGS: usize = SRC + ADDR_FIELD_LEN;
const HOPCNT: usize = FLAGS + 4;
const BCAST_ID: usize = HOPCNT + 4;

/// An RREQ or RREP. `dst` is the node whose route is being sought, `src` the
/// node that originated the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePacket {
    pub dst: NodeAddr,
    pub src: NodeAddr,
    pub flags: RouteFlags,
    pub hopcnt: u32,
    pub bcast_id: u32,
}

impl RoutePacket {
    pub fn is_request(&self) -> bool {
        self.flags.request
    }

    pub fn is_reply(&self) -> bool {
        self.flags.reply
    }

    pub fn encode(&self) -> [u8; FRAME_PAYLOAD_LEN] {
        let mut buf = [0u8; FRAME_PAYLOAD_LEN];
        write_addr(&mut buf[DST..SRC], &self.dst);
        write_addr(&mut buf[SRC..FLAGS], &self.src);
        buf[FLAGS] = self.flags.to_byte();
        write_u32(&mut buf, HOPCNT, self.hopcnt);
        write_u32(&mut buf, BCAST_ID, self.bcast_id);
        buf
    }

    pub fn decode(payload: &[u8]) -> Result<Self, PacketError> {
        if payload.len() < ROUTE_PACKET_LEN {
            return Err(PacketError::TooShort {
                min: ROUTE_PACKET_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            dst: read_addr(&payload[DST..SRC])?,
            src: read_addr(&payload[SRC..FLAGS])?,
            flags: RouteFlags::from_byte(payload[FLAGS]),
            hopcnt: read_u32(payload, HOPCNT),
            bcast_id: read_u32(payload, BCAST_ID),
        })
    }
}
