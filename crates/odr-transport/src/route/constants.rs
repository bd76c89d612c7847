//! Routing table constants.

/// Default route staleness (seconds) when none is configured.
pub const DEFAULT_STALENESS: u64 = 30;
