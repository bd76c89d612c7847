//! Pure functions for routing table update decisions.

use odr_core::types::HwAddr;

use crate::route::types::RouteEntry;

/// The outcome of evaluating a reverse route learned from a route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverseDecision {
    /// No route to the originator yet.
    InsertNew,
    /// Replace the existing route. `shorter` is set when the new path has
    /// strictly fewer hops.
    Replace { shorter: bool },
    /// Keep the existing route.
    Keep,
}

impl ReverseDecision {
    #[must_use]
    pub fn is_update(self) -> bool {
        !matches!(self, ReverseDecision::Keep)
    }

    #[must_use]
    pub fn is_shorter(self) -> bool {
        matches!(self, ReverseDecision::Replace { shorter: true })
    }
}

/// Inputs describing a received route request, from the reverse route's view.
#[derive(Debug, Clone, Copy)]
pub struct ReverseCandidate {
    /// Neighbour the request arrived from.
    pub sender: HwAddr,
    /// Hop count of the reverse path through `sender` (request hop count + 1).
    pub hopcnt: u32,
    pub bcast_id: u32,
    pub forced: bool,
    /// Whether `bcast_id` is newer than the originator's recorded id.
    pub originator_fresh: bool,
}

/// Decide whether a route request should update the route back to its
/// originator.
///
/// 1. No existing entry → `InsertNew`
/// 2. Newer originator broadcast id → `Replace`
/// 3. Forced rediscovery from a newer flood than the entry's → `Replace`
/// 4. Strictly fewer hops → `Replace { shorter: true }`
/// 5. Same hops through a different neighbour → `Replace`
/// 6. Otherwise → `Keep`
#[must_use]
pub fn decide_reverse_update(
    existing: Option<&RouteEntry>,
    candidate: &ReverseCandidate,
) -> ReverseDecision {
    let Some(entry) = existing else {
        return ReverseDecision::InsertNew;
    };
    let shorter = candidate.hopcnt < entry.hopcnt;

    if candidate.originator_fresh
        || (candidate.forced && entry.bcast_id < candidate.bcast_id)
        || shorter
        || (candidate.hopcnt == entry.hopcnt && entry.next_hop != candidate.sender)
    {
        ReverseDecision::Replace { shorter }
    } else {
        ReverseDecision::Keep
    }
}

/// Decide whether a forward route learned from a reply or from transit
/// traffic should be written: only when there is no route yet or the new one
/// is strictly shorter.
#[must_use]
pub fn should_learn_forward(existing: Option<&RouteEntry>, hopcnt: u32) -> bool {
    existing.is_none_or(|entry| entry.hopcnt > hopcnt)
}
