//! Error types for the odr-core crate.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    TooShort { min: usize, actual: usize },
    WrongProtocol(u16),
    UnknownFrameType(u16),
    UnexpectedFrameType(u16),
    InvalidAddress(String),
    FieldTooLong { max: usize, actual: usize },
    PayloadTooLarge { max: usize, actual: usize },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::TooShort { min, actual } => {
                write!(f, "frame too short: need at least {min} bytes, got {actual}")
            }
            PacketError::WrongProtocol(v) => write!(f, "unexpected protocol id: {v}"),
            PacketError::UnknownFrameType(v) => write!(f, "unknown frame type: {v}"),
            PacketError::UnexpectedFrameType(v) => {
                write!(f, "frame type {v} does not carry this payload")
            }
            PacketError::InvalidAddress(s) => write!(f, "invalid address field: {s:?}"),
            PacketError::FieldTooLong { max, actual } => {
                write!(f, "field too long: max {max} bytes, got {actual}")
            }
            PacketError::PayloadTooLarge { max, actual } => {
                write!(f, "payload too large: max {max} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for PacketError {}

/// Error returned when a byte slice has the wrong length for a fixed-size type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLength {
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for InvalidLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid length: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for InvalidLength {}
