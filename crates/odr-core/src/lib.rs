//! Core types, constants, and wire formats for the ODR routing protocol.
//!
//! This crate defines the address newtypes, the fixed-width field codec, the
//! link-layer frame and its route/application payloads, and the datagram
//! exchanged with local applications.

pub mod constants;
pub mod datagram;
pub mod error;
pub mod field;
pub mod packet;
pub mod types;

pub use constants::FrameType;
pub use datagram::OdrDatagram;
pub use error::{InvalidLength, PacketError};
pub use packet::{AppPacket, Frame, RouteFlags, RoutePacket};
pub use types::{HwAddr, IfIndex, NodeAddr, Port};
