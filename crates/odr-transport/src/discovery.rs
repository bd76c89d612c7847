//! Route discovery rate limiting.

use std::collections::HashMap;

use odr_core::types::NodeAddr;

/// Minimum interval (seconds) between route requests for the same target.
pub const DEFAULT_RREQ_MIN_INTERVAL: u64 = 1;

/// Tracks when a route request was last issued per destination.
#[must_use]
pub struct DiscoveryTracker {
    min_interval: u64,
    requests: HashMap<NodeAddr, u64>,
}

impl DiscoveryTracker {
    pub fn new(min_interval: u64) -> Self {
        Self {
            min_interval,
            requests: HashMap::new(),
        }
    }

    /// Check if a route request for `dst` is allowed. Records `now` when it is.
    pub fn try_request(&mut self, dst: &NodeAddr, now: u64) -> bool {
        if let Some(&last) = self.requests.get(dst)
            && now.saturating_sub(last) < self.min_interval
        {
            return false;
        }
        self.requests.insert(*dst, now);
        true
    }

    /// Record a request that bypassed the limit (forced rediscovery).
    pub fn force(&mut self, dst: &NodeAddr, now: u64) {
        self.requests.insert(*dst, now);
    }

    /// Forget entries whose interval has elapsed.
    pub fn cull(&mut self, now: u64) -> usize {
        let before = self.requests.len();
        let min = self.min_interval;
        self.requests
            .retain(|_, last| now.saturating_sub(*last) < min);
        before - self.requests.len()
    }
}

impl Default for DiscoveryTracker {
    fn default() -> Self {
        Self::new(DEFAULT_RREQ_MIN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiting_respects_min_interval() {
        let mut tracker = DiscoveryTracker::new(5);
        let dst = NodeAddr::new(10, 0, 0, 1);

        assert!(tracker.try_request(&dst, 100));
        assert!(!tracker.try_request(&dst, 104));
        assert!(tracker.try_request(&dst, 105));
    }

    #[test]
    fn destinations_are_independent() {
        let mut tracker = DiscoveryTracker::default();
        let a = NodeAddr::new(10, 0, 0, 1);
        let b = NodeAddr::new(10, 0, 0, 2);

        assert!(tracker.try_request(&a, 100));
        assert!(tracker.try_request(&b, 100));
        assert!(!tracker.try_request(&a, 100));
    }

    #[test]
    fn forced_request_restarts_interval() {
        let mut tracker = DiscoveryTracker::new(5);
        let dst = NodeAddr::new(10, 0, 0, 1);
        tracker.force(&dst, 100);
        assert!(!tracker.try_request(&dst, 102));
    }

    #[test]
    fn cull_drops_elapsed_entries() {
        let mut tracker = DiscoveryTracker::new(5);
        tracker.try_request(&NodeAddr::new(10, 0, 0, 1), 100);
        tracker.try_request(&NodeAddr::new(10, 0, 0, 2), 103);
        assert_eq!(tracker.cull(105), 1);
        assert_eq!(tracker.cull(200), 1);
    }
}
