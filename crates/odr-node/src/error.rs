//! Error types for the daemon and the IPC API.

use odr_core::error::PacketError;
use odr_interfaces::InterfaceError;
use odr_transport::error::RouterError;

/// Errors that can occur while building or running the daemon.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("interface error: {0}")]
    Interface(#[from] InterfaceError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("router error: {0}")]
    Router(#[from] RouterError),
    #[error("no usable interfaces")]
    NoInterfaces,
    #[error("node already running")]
    AlreadyRunning,
}

/// Errors returned by [`crate::api::OdrEndpoint`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("timed out waiting for a message")]
    Timeout,
}
