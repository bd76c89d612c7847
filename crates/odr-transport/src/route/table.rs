//! Routing table keyed by destination address.

use std::collections::HashMap;

use odr_core::types::{HwAddr, IfIndex, NodeAddr};

use super::types::RouteEntry;

/// Routing table mapping destination addresses to route entries.
///
/// Holds at most one entry per destination. [`insert_or_update`] is the only
/// way to create or change an entry.
///
/// [`insert_or_update`]: RoutingTable::insert_or_update
#[must_use]
pub struct RoutingTable {
    entries: HashMap<NodeAddr, RouteEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn lookup(&self, dst: &NodeAddr) -> Option<&RouteEntry> {
        self.entries.get(dst)
    }

    /// Create the entry for `dst`, or overwrite its fields and refresh its
    /// timestamp. Returns `true` if a new entry was created.
    pub fn insert_or_update(
        &mut self,
        dst: NodeAddr,
        next_hop: HwAddr,
        if_index: IfIndex,
        hopcnt: u32,
        bcast_id: u32,
        now: u64,
    ) -> bool {
        let entry = RouteEntry {
            dst,
            next_hop,
            if_index,
            hopcnt,
            bcast_id,
            timestamp: now,
        };
        self.entries.insert(dst, entry).is_none()
    }

    pub fn remove(&mut self, dst: &NodeAddr) -> Option<RouteEntry> {
        self.entries.remove(dst)
    }

    /// Remove every entry with `timestamp + staleness <= now`.
    ///
    /// Returns the number of entries removed.
    pub fn purge(&mut self, now: u64, staleness: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_stale(now, staleness));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.values()
    }

    /// Entries ordered by destination.
    #[must_use]
    pub fn sorted(&self) -> Vec<&RouteEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|e| e.dst);
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}
