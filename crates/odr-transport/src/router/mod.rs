//! Protocol state machine: route discovery, forwarding, and local delivery.
//!
//! The router consumes decoded frames and local requests and returns
//! [`RouterAction`]s describing frames to transmit and datagrams to deliver.

pub mod dispatch;
pub mod types;

pub use dispatch::OdrRouter;
pub use types::{RouterAction, RouterConfig};
