//! Link-layer I/O for the ODR daemon.
//!
//! This crate moves raw frames between the routing engine and the network:
//! a raw packet socket bound to the protocol id for real deployments, an
//! in-memory broadcast segment for tests and simulations, and enumeration of
//! the host's Ethernet interfaces.

pub mod error;
pub mod netif;
pub mod packet_socket;
pub mod testing;
pub mod traits;

pub use error::InterfaceError;
pub use packet_socket::PacketSocket;
pub use traits::{FrameTransport, ReceivedFrame};
