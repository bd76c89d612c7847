//! Error types for the interfaces layer.

use odr_core::error::PacketError;

/// Errors that can occur while sending, receiving or enumerating interfaces.
#[derive(Debug, thiserror::Error)]
pub enum InterfaceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("interface not found: {0}")]
    NotFound(String),
    #[error("transport closed")]
    Closed,
    #[error("configuration error: {0}")]
    Configuration(String),
}
