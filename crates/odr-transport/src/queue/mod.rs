//! Outbound queue of messages waiting for a route.
//!
//! Items are serviced strictly from the head: the head is the only item the
//! router ever examines, so a blocked head holds back everything behind it
//! until it is resolved or expires.

use std::collections::VecDeque;

use odr_core::packet::{AppPacket, RoutePacket};
use odr_core::types::NodeAddr;

/// Default time (seconds) an item may wait before it is dropped.
pub const DEFAULT_QUEUE_TIMEOUT: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedPayload {
    AppMessage(AppPacket),
    /// A route reply being relayed back toward the requester.
    RouteReply(RoutePacket),
}

impl QueuedPayload {
    /// Address the item must be routed toward.
    ///
    /// Route replies travel the reverse path, so they head to the packet's
    /// source (the original requester).
    #[must_use]
    pub fn next_target(&self) -> NodeAddr {
        match self {
            QueuedPayload::AppMessage(p) => p.dst,
            QueuedPayload::RouteReply(p) => p.src,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub payload: QueuedPayload,
    /// Drop the cached route and rediscover before sending.
    pub forced: bool,
    pub enqueued_at: u64,
}

impl QueueItem {
    pub fn app(packet: AppPacket, forced: bool, now: u64) -> Self {
        Self {
            payload: QueuedPayload::AppMessage(packet),
            forced,
            enqueued_at: now,
        }
    }

    pub fn route_reply(packet: RoutePacket, now: u64) -> Self {
        Self {
            payload: QueuedPayload::RouteReply(packet),
            forced: false,
            enqueued_at: now,
        }
    }

    /// Uses strict `>` comparison.
    #[must_use]
    pub fn is_expired(&self, now: u64, timeout: u64) -> bool {
        now.saturating_sub(self.enqueued_at) > timeout
    }
}

#[derive(Debug, Default)]
#[must_use]
pub struct OutboundQueue {
    items: VecDeque<QueueItem>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: QueueItem) {
        self.items.push_back(item);
    }

    #[must_use]
    pub fn head(&self) -> Option<&QueueItem> {
        self.items.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut QueueItem> {
        self.items.front_mut()
    }

    pub fn pop_head(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
