//! Routing table entry.

use odr_core::types::{HwAddr, IfIndex, NodeAddr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub dst: NodeAddr,
    /// Hardware address of the neighbour to forward through.
    pub next_hop: HwAddr,
    /// Local interface the neighbour is reachable on.
    pub if_index: IfIndex,
    pub hopcnt: u32,
    /// Broadcast id of the route request this entry was last learned from.
    pub bcast_id: u32,
    /// Seconds since epoch of the last learn/refresh.
    pub timestamp: u64,
}

impl RouteEntry {
    /// Stale once `timestamp + staleness <= now`.
    #[must_use]
    pub fn is_stale(&self, now: u64, staleness: u64) -> bool {
        self.timestamp.saturating_add(staleness) <= now
    }

    #[must_use]
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }
}
