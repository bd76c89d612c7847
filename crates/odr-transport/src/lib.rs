//! Routing engine for the on-demand routing protocol.
//!
//! This crate holds the routing, port, and broadcast-id tables, the outbound
//! queue, and the protocol state machine. Nothing here performs I/O: the
//! router consumes decoded events and returns [`router::RouterAction`]s for
//! the caller to carry out.

pub mod bcast;
pub mod discovery;
pub mod error;
pub mod interfaces;
pub mod port;
pub mod queue;
pub mod route;
pub mod route_decision;
pub mod router;
