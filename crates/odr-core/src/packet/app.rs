//! Application message packet.
//!
//! ```text
//! dst(20) | dst_port(u32) | src(20) | src_port(u32) | length(u32) |
//! hopcnt(u32) | flags(1) | reserved(3) | data(48)
//! ```
//!
//! Only bit 2 (forced rediscovery) of the flag byte is meaningful.

use crate::constants::{ADDR_FIELD_LEN, APP_DATA_CAPACITY, APP_HEADER_LEN, FRAME_PAYLOAD_LEN};
use crate::error::PacketError;
use crate::field::{read_addr, read_u32, write_addr, write_u32};
use crate::types::{NodeAddr, Port};

const FORCED: u8 = 0x04;

const DST: usize = 0;
const DST_PORT: usize = DST + ADDR_FIELD_LEN;
const SRC: usize = DST_PORT + 4;
const SRC_PORT: usize = SRC + ADDR_FIELD_LEN;
const LENGTH: usize = SRC_PORT + 4;
const HOPCNT: usize = LENGTH + 4;
const FLAGS: usize = HOPCNT + 4;
const DATA: usize = APP_HEADER_LEN;

/// An application message in transit between two endpoints.
///
/// The wire `length` field is derived from `data`, which never exceeds
/// [`APP_DATA_CAPACITY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPacket {
    pub dst: NodeAddr,
    pub dst_port: Port,
    pub src: NodeAddr,
    pub src_port: Port,
    pub hopcnt: u32,
    pub forced: bool,
    data: Vec<u8>,
}

impl AppPacket {
    pub fn new(
        dst: NodeAddr,
        dst_port: Port,
        src: NodeAddr,
        src_port: Port,
        data: &[u8],
    ) -> Result<Self, PacketError> {
        check_data_len(data.len())?;
        Ok(Self {
            dst,
            dst_port,
            src,
            src_port,
            hopcnt: 0,
            forced: false,
            data: data.to_vec(),
        })
    }

    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn encode(&self) -> [u8; FRAME_PAYLOAD_LEN] {
        let mut buf = [0u8; FRAME_PAYLOAD_LEN];
        write_addr(&mut buf[DST..DST_PORT], &self.dst);
        write_u32(&mut buf, DST_PORT, self.dst_port);
        write_addr(&mut buf[SRC..SRC_PORT], &self.src);
        write_u32(&mut buf, SRC_PORT, self.src_port);
        write_u32(&mut buf, LENGTH, self.data.len() as u32);
        write_u32(&mut buf, HOPCNT, self.hopcnt);
        buf[FLAGS] = if self.forced { FORCED } else { 0 };
        buf[DATA..DATA + self.data.len()].copy_from_slice(&self.data);
        buf
    }

    pub fn decode(payload: &[u8]) -> Result<Self, PacketError> {
        if payload.len() < FRAME_PAYLOAD_LEN {
            return Err(PacketError::TooShort {
                min: FRAME_PAYLOAD_LEN,
                actual: payload.len(),
            });
        }
        let length = read_u32(payload, LENGTH) as usize;
        check_data_len(length)?;
        Ok(Self {
            dst: read_addr(&payload[DST..DST_PORT])?,
            dst_port: read_u32(payload, DST_PORT),
            src: read_addr(&payload[SRC..SRC_PORT])?,
            src_port: read_u32(payload, SRC_PORT),
            hopcnt: read_u32(payload, HOPCNT),
            forced: payload[FLAGS] & FORCED != 0,
            data: payload[DATA..DATA + length].to_vec(),
        })
    }
}

fn check_data_len(len: usize) -> Result<(), PacketError> {
    if len > APP_DATA_CAPACITY {
        return Err(PacketError::PayloadTooLarge {
            max: APP_DATA_CAPACITY,
            actual: len,
        });
    }
    Ok(())
}
