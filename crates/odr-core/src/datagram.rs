//! Local IPC datagram exchanged between the daemon and applications.
//!
//! ```text
//! addr(20) | port(u32 BE) | flag(u32 BE) | data(48)
//! ```
//!
//! Application to daemon: `addr`/`port` name the remote destination and
//! `flag` requests forced rediscovery. Daemon to application: `addr`/`port`
//! name the remote sender and `flag` is always zero.

use crate::constants::{
    ADDR_FIELD_LEN, APP_DATA_CAPACITY, DATAGRAM_HEADER_LEN, DATAGRAM_LEN,
};
use crate::error::PacketError;
use crate::field::{read_addr, read_u32, write_addr, write_u32};
use crate::types::{NodeAddr, Port};

const PORT: usize = ADDR_FIELD_LEN;
const FLAG: usize = PORT + 4;
const DATA: usize = DATAGRAM_HEADER_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdrDatagram {
    pub addr: NodeAddr,
    pub port: Port,
    pub forced: bool,
    data: Vec<u8>,
}

impl OdrDatagram {
    pub fn new(addr: NodeAddr, port: Port, forced: bool, data: &[u8]) -> Result<Self, PacketError> {
        if data.len() > APP_DATA_CAPACITY {
            return Err(PacketError::PayloadTooLarge {
                max: APP_DATA_CAPACITY,
                actual: data.len(),
            });
        }
        Ok(Self {
            addr,
            port,
            forced,
            data: data.to_vec(),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn encode(&self) -> [u8; DATAGRAM_LEN] {
        let mut buf = [0u8; DATAGRAM_LEN];
        write_addr(&mut buf[..PORT], &self.addr);
        write_u32(&mut buf, PORT, self.port);
        write_u32(&mut buf, FLAG, u32::from(self.forced));
        buf[DATA..DATA + self.data.len()].copy_from_slice(&self.data);
        buf
    }

    /// Decode a datagram. Data is taken up to the first NUL, so text payloads
    /// shorter than the capacity come back without padding.
    pub fn decode(raw: &[u8]) -> Result<Self, PacketError> {
        if raw.len() < DATA {
            return Err(PacketError::TooShort {
                min: DATA,
                actual: raw.len(),
            });
        }
        let body = &raw[DATA..raw.len().min(DATAGRAM_LEN)];
        let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
        Ok(Self {
            addr: read_addr(&raw[..PORT])?,
            port: read_u32(raw, PORT),
            forced: read_u32(raw, FLAG) != 0,
            data: body[..end].to_vec(),
        })
    }
}
