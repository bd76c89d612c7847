//! ODR routing daemon.
//!
//! This crate ties the routing engine to real I/O: it owns the frame
//! transport and the local IPC socket, runs the single event loop, and
//! provides configuration, logging and the client-side IPC API used by the
//! bundled applications.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod hosts;
pub mod logging;
pub mod node;

pub use api::OdrEndpoint;
pub use config::NodeConfig;
pub use error::{ApiError, NodeError};
pub use hosts::HostTable;
pub use node::{Node, ShutdownHandle};
