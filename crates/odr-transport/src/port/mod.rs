//! Port/path table demultiplexing local application endpoints.

pub mod constants;
pub mod table;

pub use constants::*;
pub use table::{PortEntry, PortTable};
