//! Transport layer error types.

use odr_core::error::PacketError;
use odr_core::types::{IfIndex, NodeAddr};

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("packet error: {0}")]
    PacketError(#[from] PacketError),

    #[error("no reverse route to {0}")]
    MissingReverseRoute(NodeAddr),

    #[error("interface {0} is not in the interface table")]
    UnknownInterface(IfIndex),

    #[error("no free port in the ephemeral range")]
    PortsExhausted,
}
