//! Fixed-width field encoding.
//!
//! String fields on the wire are fixed-size, null-padded byte regions. The
//! encoder always leaves at least one trailing NUL so peers that treat the
//! field as a C string stay in bounds; the decoder stops at the first NUL or
//! at the field boundary, whichever comes first.

use crate::constants::ADDR_FIELD_LEN;
use crate::error::PacketError;
use crate::types::NodeAddr;

/// Write `value` into `field`, zero-filling the remainder.
pub fn write_str_field(field: &mut [u8], value: &[u8]) -> Result<(), PacketError> {
    let max = field.len().saturating_sub(1);
    if value.len() > max {
        return Err(PacketError::FieldTooLong {
            max,
            actual: value.len(),
        });
    }
    field.fill(0);
    field[..value.len()].copy_from_slice(value);
    Ok(())
}

/// Read the content of a null-padded field.
pub fn read_str_field(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Write a node address as a dotted-quad string field.
pub fn write_addr(field: &mut [u8], addr: &NodeAddr) {
    debug_assert_eq!(field.len(), ADDR_FIELD_LEN);
    // "255.255.255.255" is 15 bytes, always fits in the 20-byte field.
    let text = addr.to_string();
    field.fill(0);
    field[..text.len()].copy_from_slice(text.as_bytes());
}

/// Read and validate a dotted-quad address field.
pub fn read_addr(field: &[u8]) -> Result<NodeAddr, PacketError> {
    let raw = read_str_field(field);
    let text = core::str::from_utf8(raw)
        .map_err(|_| PacketError::InvalidAddress(String::from_utf8_lossy(raw).into_owned()))?;
    text.parse()
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_be_bytes(bytes)
}

pub(crate) fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}
