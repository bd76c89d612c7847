//! Routing table: one next hop per destination, learned on demand.

pub mod constants;
pub mod table;
pub mod types;

pub use constants::*;
pub use table::RoutingTable;
pub use types::RouteEntry;
