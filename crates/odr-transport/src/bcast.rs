//! Last-seen broadcast ids per (originator, target) pair.
//!
//! Suppresses re-processing of duplicate or stale route requests. The
//! originator-level record uses the key `(src, src)`.
//!
//! Records expire once they have not been refreshed for the route staleness
//! period. An originator that restarts and counts from 1 again is therefore
//! ignored only until its old records age out, after which its requests are
//! accepted as new.

use std::collections::HashMap;

use odr_core::types::NodeAddr;

#[must_use]
pub struct BroadcastIdTable {
    /// Last id and the time it was recorded.
    seen: HashMap<(NodeAddr, NodeAddr), (u32, u64)>,
}

impl BroadcastIdTable {
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    /// `true` if `bcast_id` is strictly greater than the recorded id, or if
    /// nothing is recorded for the pair.
    #[must_use]
    pub fn is_newer(&self, src: &NodeAddr, dst: &NodeAddr, bcast_id: u32) -> bool {
        self.seen
            .get(&(*src, *dst))
            .is_none_or(|&(last, _)| bcast_id > last)
    }

    pub fn record(&mut self, src: NodeAddr, dst: NodeAddr, bcast_id: u32, now: u64) {
        self.seen.insert((src, dst), (bcast_id, now));
    }

    #[must_use]
    pub fn get(&self, src: &NodeAddr, dst: &NodeAddr) -> Option<u32> {
        self.seen.get(&(*src, *dst)).map(|&(id, _)| id)
    }

    /// Drop records with `recorded_at + max_age <= now`. Returns how many
    /// were removed.
    pub fn purge(&mut self, now: u64, max_age: u64) -> usize {
        let before = self.seen.len();
        self.seen
            .retain(|_, &mut (_, recorded_at)| recorded_at.saturating_add(max_age) > now);
        before - self.seen.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for BroadcastIdTable {
    fn default() -> Self {
        Self::new()
    }
}
