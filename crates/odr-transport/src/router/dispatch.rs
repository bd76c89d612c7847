//! Central frame dispatch and queue draining.

use odr_core::constants::FrameType;
use odr_core::datagram::OdrDatagram;
use odr_core::packet::{AppPacket, Frame, RouteFlags, RoutePacket};
use odr_core::types::{HwAddr, IfIndex, NodeAddr};

use crate::bcast::BroadcastIdTable;
use crate::discovery::DiscoveryTracker;
use crate::error::RouterError;
use crate::interfaces::InterfaceTable;
use crate::port::PortTable;
use crate::queue::{OutboundQueue, QueueItem, QueuedPayload};
use crate::route::RoutingTable;
use crate::route_decision::{ReverseCandidate, decide_reverse_update, should_learn_forward};
use crate::router::types::{RouterAction, RouterConfig};

/// The on-demand routing engine.
///
/// Owns every table the protocol mutates. Each handler processes one event
/// to completion, including any queue drain it triggers, and returns the
/// resulting actions.
pub struct OdrRouter {
    config: RouterConfig,
    interfaces: InterfaceTable,
    routes: RoutingTable,
    ports: PortTable,
    bcast_ids: BroadcastIdTable,
    discovery: DiscoveryTracker,
    queue: OutboundQueue,
    /// Id carried by this node's most recent route request.
    bcast_id: u32,
}

impl OdrRouter {
    pub fn new(config: RouterConfig, interfaces: InterfaceTable) -> Self {
        let ports = PortTable::new(config.time_server_path.clone(), config.time_server_port);
        let discovery = DiscoveryTracker::new(config.rreq_min_interval);
        Self {
            config,
            interfaces,
            routes: RoutingTable::new(),
            ports,
            bcast_ids: BroadcastIdTable::new(),
            discovery,
            queue: OutboundQueue::new(),
            bcast_id: 0,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn local_addr(&self) -> NodeAddr {
        self.config.local_addr
    }

    pub fn interfaces(&self) -> &InterfaceTable {
        &self.interfaces
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn routing_table_mut(&mut self) -> &mut RoutingTable {
        &mut self.routes
    }

    pub fn port_table(&self) -> &PortTable {
        &self.ports
    }

    pub fn port_table_mut(&mut self) -> &mut PortTable {
        &mut self.ports
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub fn bcast_ids(&self) -> &BroadcastIdTable {
        &self.bcast_ids
    }

    /// Id of the last route request this node originated (0 before the first).
    pub fn current_bcast_id(&self) -> u32 {
        self.bcast_id
    }

    /// Decode a received frame and run the matching handler.
    pub fn handle_frame(
        &mut self,
        raw: &[u8],
        sender: HwAddr,
        if_index: IfIndex,
        now: u64,
    ) -> Result<Vec<RouterAction>, RouterError> {
        if self.interfaces.get(if_index).is_none() {
            tracing::debug!(%sender, %if_index, "frame on unmanaged interface, dropping");
            return Ok(Vec::new());
        }
        let frame = Frame::parse(raw)?;
        tracing::trace!(
            frame_type = ?frame.frame_type,
            %sender,
            %if_index,
            "received frame"
        );

        match frame.frame_type {
            FrameType::RouteRequest => {
                let rreq = frame.route_packet()?;
                self.handle_rreq(&rreq, sender, if_index, now)
            }
            FrameType::RouteReply => {
                let rrep = frame.route_packet()?;
                Ok(self.handle_rrep(&rrep, sender, if_index, now))
            }
            FrameType::AppMessage => {
                let app = frame.app_packet()?;
                Ok(self.handle_appmsg(&app, sender, if_index, now))
            }
            FrameType::RouteDebug => {
                tracing::info!(%sender, %if_index, routes = self.routes.len(), "route dump requested");
                for line in self.route_dump(now) {
                    tracing::info!("{line}");
                }
                Ok(Vec::new())
            }
            FrameType::DataDebug => {
                tracing::info!(%sender, %if_index, text = %frame.debug_text(), "debug data");
                Ok(Vec::new())
            }
        }
    }

    /// Process a received route request.
    pub fn handle_rreq(
        &mut self,
        rreq: &RoutePacket,
        sender: HwAddr,
        if_index: IfIndex,
        now: u64,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let local = self.config.local_addr;
        if rreq.src == local {
            tracing::trace!(bcast_id = rreq.bcast_id, "ignoring own route request");
            return Ok(Vec::new());
        }

        let reverse_hopcnt = rreq.hopcnt.saturating_add(1);
        let originator_fresh = self
            .bcast_ids
            .is_newer(&rreq.src, &rreq.src, rreq.bcast_id);
        let decision = decide_reverse_update(
            self.routes.lookup(&rreq.src),
            &ReverseCandidate {
                sender,
                hopcnt: reverse_hopcnt,
                bcast_id: rreq.bcast_id,
                forced: rreq.flags.forced,
                originator_fresh,
            },
        );
        if originator_fresh {
            self.bcast_ids.record(rreq.src, rreq.src, rreq.bcast_id, now);
        }
        if decision.is_update() {
            self.routes.insert_or_update(
                rreq.src,
                sender,
                if_index,
                reverse_hopcnt,
                rreq.bcast_id,
                now,
            );
            tracing::debug!(
                dst = %rreq.src,
                next_hop = %sender,
                %if_index,
                hopcnt = reverse_hopcnt,
                bcast_id = rreq.bcast_id,
                "reverse route updated"
            );
        }

        let fresh = self
            .bcast_ids
            .is_newer(&rreq.src, &rreq.dst, rreq.bcast_id);
        if fresh {
            self.bcast_ids.record(rreq.src, rreq.dst, rreq.bcast_id, now);
        }

        let mut actions = Vec::new();

        if rreq.dst == local {
            if fresh {
                let reply = RoutePacket {
                    dst: local,
                    src: rreq.src,
                    flags: RouteFlags::reply(rreq.flags.forced),
                    hopcnt: 0,
                    bcast_id: rreq.bcast_id,
                };
                actions.push(self.send_rrep(&reply)?);
                tracing::debug!(src = %rreq.src, bcast_id = rreq.bcast_id, "replied to route request for self");
            }
            if decision.is_update() {
                actions.extend(self.drain_queue(now));
            }
            return Ok(actions);
        }

        let mut reply_sent = rreq.flags.reply_sent;
        if fresh && !rreq.flags.forced && !rreq.flags.reply_sent {
            let known = self
                .routes
                .lookup(&rreq.dst)
                .map(|route| (route.next_hop, route.hopcnt));
            match known {
                Some((next_hop, hopcnt)) if next_hop != sender => {
                    let reply = RoutePacket {
                        dst: rreq.dst,
                        src: rreq.src,
                        flags: RouteFlags::reply(false),
                        hopcnt,
                        bcast_id: rreq.bcast_id,
                    };
                    actions.push(self.send_rrep(&reply)?);
                    reply_sent = true;
                    tracing::debug!(
                        dst = %rreq.dst,
                        src = %rreq.src,
                        hopcnt,
                        "replied on behalf of destination"
                    );
                }
                Some(_) => {
                    tracing::debug!(dst = %rreq.dst, %sender, "split horizon, not replying");
                }
                None => {}
            }
        }

        if fresh || decision.is_shorter() {
            let forward = RoutePacket {
                dst: rreq.dst,
                src: rreq.src,
                flags: RouteFlags {
                    reply_sent,
                    ..rreq.flags
                },
                hopcnt: reverse_hopcnt,
                bcast_id: rreq.bcast_id,
            };
            tracing::debug!(
                dst = %rreq.dst,
                src = %rreq.src,
                hopcnt = reverse_hopcnt,
                bcast_id = rreq.bcast_id,
                reply_sent,
                "rebroadcasting route request"
            );
            actions.extend(self.broadcast_route_packet(&forward));
        }

        if decision.is_update() {
            actions.extend(self.drain_queue(now));
        }
        Ok(actions)
    }

    /// Process a received route reply.
    pub fn handle_rrep(
        &mut self,
        rrep: &RoutePacket,
        sender: HwAddr,
        if_index: IfIndex,
        now: u64,
    ) -> Vec<RouterAction> {
        let local = self.config.local_addr;
        let hopcnt = rrep.hopcnt.saturating_add(1);

        if rrep.dst != local {
            let existing = self.routes.lookup(&rrep.dst);
            if should_learn_forward(existing, hopcnt) {
                let bcast_id = existing.map_or(0, |e| e.bcast_id);
                self.routes
                    .insert_or_update(rrep.dst, sender, if_index, hopcnt, bcast_id, now);
                tracing::info!(
                    dst = %rrep.dst,
                    next_hop = %sender,
                    %if_index,
                    hopcnt,
                    "route learned"
                );
            }
        }

        if rrep.src != local {
            let forward = RoutePacket {
                hopcnt,
                ..rrep.clone()
            };
            tracing::debug!(dst = %rrep.dst, src = %rrep.src, hopcnt, "queued route reply for relay");
            self.queue.enqueue(QueueItem::route_reply(forward, now));
        }

        self.drain_queue(now)
    }

    /// Process a received application message.
    pub fn handle_appmsg(
        &mut self,
        app: &AppPacket,
        sender: HwAddr,
        if_index: IfIndex,
        now: u64,
    ) -> Vec<RouterAction> {
        let local = self.config.local_addr;
        let hopcnt = app.hopcnt.saturating_add(1);

        if app.src != local {
            let existing = self.routes.lookup(&app.src);
            if should_learn_forward(existing, hopcnt) {
                let bcast_id = existing.map_or(0, |e| e.bcast_id);
                self.routes
                    .insert_or_update(app.src, sender, if_index, hopcnt, bcast_id, now);
                tracing::debug!(
                    dst = %app.src,
                    next_hop = %sender,
                    hopcnt,
                    "route learned from application traffic"
                );
            }
        }

        let mut actions = Vec::new();
        if app.dst == local {
            actions.extend(self.deliver_local(app));
        } else {
            let mut forward = app.clone();
            forward.hopcnt = hopcnt;
            tracing::debug!(dst = %app.dst, src = %app.src, hopcnt, "queued message for relay");
            self.queue.enqueue(QueueItem::app(forward, false, now));
        }
        actions.extend(self.drain_queue(now));
        actions
    }

    /// Accept a send request from the local endpoint bound at `path`.
    pub fn handle_local_request(
        &mut self,
        path: &str,
        request: &OdrDatagram,
        now: u64,
    ) -> Result<Vec<RouterAction>, RouterError> {
        let src_port = self.ports.get_or_create_port(path, now)?;
        let packet = AppPacket::new(
            request.addr,
            request.port,
            self.config.local_addr,
            src_port,
            request.data(),
        )?
        .with_forced(request.forced);

        tracing::debug!(
            path,
            dst = %request.addr,
            dst_port = request.port,
            src_port,
            forced = request.forced,
            "queued local message"
        );
        self.queue
            .enqueue(QueueItem::app(packet, request.forced, now));
        Ok(self.drain_queue(now))
    }

    /// Service the outbound queue from the head until the head is blocked on
    /// route discovery or the queue is empty.
    pub fn drain_queue(&mut self, now: u64) -> Vec<RouterAction> {
        let local = self.config.local_addr;
        let mut actions = Vec::new();

        while let Some(head) = self.queue.head() {
            if head.is_expired(now, self.config.queue_timeout) {
                tracing::debug!(
                    dst = %head.payload.next_target(),
                    enqueued_at = head.enqueued_at,
                    "queue item expired"
                );
                self.queue.pop_head();
                continue;
            }

            let target = head.payload.next_target();
            let forced = head.forced;

            if let QueuedPayload::AppMessage(packet) = &head.payload
                && packet.dst == local
            {
                let packet = packet.clone();
                self.queue.pop_head();
                actions.extend(self.deliver_local(&packet));
                continue;
            }

            if forced {
                if let Some(head) = self.queue.head_mut() {
                    head.forced = false;
                }
                self.routes.remove(&target);
                self.discovery.force(&target, now);
                tracing::info!(dst = %target, "forced route rediscovery");
                actions.extend(self.send_rreq(target, true));
                break;
            }

            let Some(route) = self.routes.lookup(&target) else {
                if self.discovery.try_request(&target, now) {
                    actions.extend(self.send_rreq(target, false));
                } else {
                    tracing::trace!(dst = %target, "route request rate limited");
                }
                break;
            };
            let (next_hop, if_index) = (route.next_hop, route.if_index);

            let Some(source) = self.interfaces.get(if_index).map(|i| i.hw_addr) else {
                tracing::warn!(dst = %target, %if_index, "route uses unknown interface, removing");
                self.routes.remove(&target);
                continue;
            };

            let Some(item) = self.queue.pop_head() else {
                break;
            };
            let frame = match &item.payload {
                QueuedPayload::AppMessage(packet) => Frame::app(next_hop, source, packet),
                QueuedPayload::RouteReply(packet) => Frame::route(next_hop, source, packet),
            };
            tracing::debug!(dst = %target, %next_hop, %if_index, "sending queued item");
            actions.push(RouterAction::Transmit {
                if_index,
                dest: next_hop,
                frame: frame.serialize(),
            });
        }

        actions
    }

    /// Broadcast a new route request for `dst` on every interface.
    pub fn send_rreq(&mut self, dst: NodeAddr, forced: bool) -> Vec<RouterAction> {
        self.bcast_id = self.bcast_id.wrapping_add(1);
        let rreq = RoutePacket {
            dst,
            src: self.config.local_addr,
            flags: RouteFlags::request(forced),
            hopcnt: 0,
            bcast_id: self.bcast_id,
        };
        tracing::debug!(%dst, bcast_id = self.bcast_id, forced, "sending route request");
        self.broadcast_route_packet(&rreq)
    }

    /// Unicast a route reply back toward its requester (`reply.src`).
    ///
    /// Callers only reply after learning the reverse route, so a missing route
    /// is a logic error.
    pub fn send_rrep(&self, reply: &RoutePacket) -> Result<RouterAction, RouterError> {
        let route = self
            .routes
            .lookup(&reply.src)
            .ok_or(RouterError::MissingReverseRoute(reply.src))?;
        let iface = self
            .interfaces
            .get(route.if_index)
            .ok_or(RouterError::UnknownInterface(route.if_index))?;
        let frame = Frame::route(route.next_hop, iface.hw_addr, reply);
        Ok(RouterAction::Transmit {
            if_index: route.if_index,
            dest: route.next_hop,
            frame: frame.serialize(),
        })
    }

    fn broadcast_route_packet(&self, packet: &RoutePacket) -> Vec<RouterAction> {
        self.interfaces
            .iter()
            .map(|iface| RouterAction::Transmit {
                if_index: iface.if_index,
                dest: HwAddr::BROADCAST,
                frame: Frame::route(HwAddr::BROADCAST, iface.hw_addr, packet).serialize(),
            })
            .collect()
    }

    fn deliver_local(&self, app: &AppPacket) -> Option<RouterAction> {
        let Some(path) = self.ports.lookup_by_port(app.dst_port) else {
            tracing::warn!(port = app.dst_port, src = %app.src, "no local endpoint for port, dropping");
            return None;
        };
        match OdrDatagram::new(app.src, app.src_port, false, app.data()) {
            Ok(datagram) => {
                tracing::info!(src = %app.src, src_port = app.src_port, path, "delivering message");
                Some(RouterAction::DeliverLocal {
                    path: path.to_string(),
                    datagram,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "undeliverable message");
                None
            }
        }
    }

    /// Remove stale routes and idle port entries.
    pub fn purge(&mut self, now: u64) {
        let routes = self.routes.purge(now, self.config.staleness);
        let ports = self.ports.purge(now, self.config.port_ttl);
        let bcast_ids = self.bcast_ids.purge(now, self.config.staleness);
        self.discovery.cull(now);
        if routes > 0 || ports > 0 || bcast_ids > 0 {
            tracing::debug!(routes, ports, bcast_ids, "purged stale entries");
        }
    }

    /// One formatted line per route, ordered by destination.
    pub fn route_dump(&self, now: u64) -> Vec<String> {
        self.routes
            .sorted()
            .into_iter()
            .map(|e| {
                format!(
                    "| {:<20} | {} | {:>2} | {:>2} | {:>4} | {:>4}s |",
                    e.dst.to_string(),
                    e.next_hop,
                    e.if_index,
                    e.hopcnt,
                    e.bcast_id,
                    e.age(now)
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::InterfaceEntry;
    use odr_core::error::PacketError;

    const LOCAL: NodeAddr = NodeAddr::new(10, 0, 0, 1);
    const SERVER_PATH: &str = "/tmp/test-server";
    const CLIENT_PATH: &str = "/tmp/test-client";

    fn mac(seed: u8) -> HwAddr {
        HwAddr::new([0x02, 0, 0, 0, 0, seed])
    }

    fn addr(last: u8) -> NodeAddr {
        NodeAddr::new(10, 0, 0, last)
    }

    fn iface(index: i32, hw: HwAddr) -> InterfaceEntry {
        InterfaceEntry {
            name: format!("eth{index}"),
            hw_addr: hw,
            if_index: IfIndex(index),
            ip: None,
            alias: false,
        }
    }

    fn config(local: NodeAddr) -> RouterConfig {
        RouterConfig {
            local_addr: local,
            time_server_path: SERVER_PATH.to_string(),
            ..RouterConfig::default()
        }
    }

    fn make_router() -> OdrRouter {
        OdrRouter::new(
            config(LOCAL),
            InterfaceTable::new(vec![iface(2, mac(0xA2)), iface(3, mac(0xA3))]),
        )
    }

    fn request(dst: NodeAddr, forced: bool) -> OdrDatagram {
        OdrDatagram::new(dst, 14508, forced, b"time?").unwrap()
    }

    fn rreq(src: NodeAddr, dst: NodeAddr, hopcnt: u32, bcast_id: u32) -> RoutePacket {
        RoutePacket {
            dst,
            src,
            flags: RouteFlags::request(false),
            hopcnt,
            bcast_id,
        }
    }

    fn transmits(actions: &[RouterAction]) -> Vec<(IfIndex, HwAddr, Frame)> {
        actions
            .iter()
            .filter_map(|a| match a {
                RouterAction::Transmit {
                    if_index,
                    dest,
                    frame,
                } => Some((*if_index, *dest, Frame::parse(frame).unwrap())),
                RouterAction::DeliverLocal { .. } => None,
            })
            .collect()
    }

    fn broadcasts(actions: &[RouterAction]) -> usize {
        transmits(actions)
            .iter()
            .filter(|(_, dest, _)| dest.is_broadcast())
            .count()
    }

    fn unicasts(actions: &[RouterAction]) -> Vec<(IfIndex, HwAddr, Frame)> {
        transmits(actions)
            .into_iter()
            .filter(|(_, dest, _)| !dest.is_broadcast())
            .collect()
    }

    // === Scenarios ===

    #[test]
    fn unknown_destination_broadcasts_rreq_and_keeps_item() {
        let mut router = make_router();
        let actions = router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();

        let sent = transmits(&actions);
        assert_eq!(sent.len(), 2);
        for ((if_index, dest, frame), expected) in sent.iter().zip([(2, 0xA2), (3, 0xA3)]) {
            assert_eq!(*if_index, IfIndex(expected.0));
            assert!(dest.is_broadcast());
            assert_eq!(frame.source, mac(expected.1));
            assert_eq!(frame.frame_type, FrameType::RouteRequest);
            let packet = frame.route_packet().unwrap();
            assert_eq!(packet.dst, addr(5));
            assert_eq!(packet.src, LOCAL);
            assert_eq!(packet.hopcnt, 0);
            assert_eq!(packet.bcast_id, 1);
        }
        assert_eq!(router.queue().len(), 1);
    }

    #[test]
    fn rreq_for_self_sends_one_rrep_and_no_rebroadcast() {
        let mut router = make_router();
        let actions = router
            .handle_rreq(&rreq(addr(7), LOCAL, 2, 4), mac(0x07), IfIndex(3), 1000)
            .unwrap();

        assert_eq!(broadcasts(&actions), 0);
        let sent = unicasts(&actions);
        assert_eq!(sent.len(), 1);
        let (if_index, dest, frame) = &sent[0];
        assert_eq!(*if_index, IfIndex(3));
        assert_eq!(*dest, mac(0x07));
        assert_eq!(frame.source, mac(0xA3));
        assert_eq!(frame.frame_type, FrameType::RouteReply);
        let reply = frame.route_packet().unwrap();
        assert_eq!(reply.dst, LOCAL);
        assert_eq!(reply.src, addr(7));
        assert_eq!(reply.hopcnt, 0);
        assert!(reply.flags.reply);

        let reverse = router.routing_table().lookup(&addr(7)).unwrap();
        assert_eq!(reverse.hopcnt, 3);
        assert_eq!(reverse.next_hop, mac(0x07));
    }

    #[test]
    fn relayed_rrep_learns_route_and_queues_one_forward() {
        let mut router = make_router();
        let rrep = RoutePacket {
            dst: addr(9),
            src: addr(4),
            flags: RouteFlags::reply(false),
            hopcnt: 2,
            bcast_id: 6,
        };
        router.handle_rrep(&rrep, mac(0x08), IfIndex(2), 1000);

        let route = router.routing_table().lookup(&addr(9)).unwrap();
        assert_eq!(route.hopcnt, 3);
        assert_eq!(route.next_hop, mac(0x08));
        assert_eq!(route.bcast_id, 0);

        let queued: Vec<_> = router
            .queue()
            .iter()
            .filter(|i| matches!(i.payload, QueuedPayload::RouteReply(_)))
            .collect();
        assert_eq!(queued.len(), 1);
        let QueuedPayload::RouteReply(forward) = &queued[0].payload else {
            unreachable!()
        };
        assert_eq!(forward.hopcnt, 3);
        assert_eq!(forward.src, addr(4));
    }

    #[test]
    fn resolvable_item_becomes_one_unicast() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(5), mac(0x55), IfIndex(3), 2, 0, 1000);

        let actions = router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();

        let sent = transmits(&actions);
        assert_eq!(sent.len(), 1);
        let (if_index, dest, frame) = &sent[0];
        assert_eq!(*if_index, IfIndex(3));
        assert_eq!(*dest, mac(0x55));
        assert_eq!(frame.dest, mac(0x55));
        assert_eq!(frame.source, mac(0xA3));
        let app = frame.app_packet().unwrap();
        assert_eq!(app.dst, addr(5));
        assert_eq!(app.src, LOCAL);
        assert_eq!(app.src_port, 14509);
        assert_eq!(app.data(), b"time?");
        assert!(router.queue().is_empty());
    }

    // === Route requests ===

    #[test]
    fn own_request_echo_is_ignored() {
        let mut router = make_router();
        let actions = router
            .handle_rreq(&rreq(LOCAL, addr(5), 1, 1), mac(0x02), IfIndex(2), 1000)
            .unwrap();
        assert!(actions.is_empty());
        assert!(router.routing_table().is_empty());
    }

    #[test]
    fn intermediate_rebroadcasts_fresh_rreq_once() {
        let mut router = make_router();
        let packet = rreq(addr(7), addr(9), 1, 3);

        let first = router
            .handle_rreq(&packet, mac(0x07), IfIndex(2), 1000)
            .unwrap();
        assert_eq!(broadcasts(&first), 2);
        let (_, _, frame) = &transmits(&first)[0];
        let forwarded = frame.route_packet().unwrap();
        assert_eq!(forwarded.hopcnt, 2);
        assert_eq!(forwarded.bcast_id, 3);
        assert_eq!(forwarded.src, addr(7));
        assert!(!forwarded.flags.reply_sent);

        let duplicate = router
            .handle_rreq(&packet, mac(0x17), IfIndex(3), 1000)
            .unwrap();
        assert!(duplicate.is_empty());
    }

    #[test]
    fn shorter_duplicate_is_rebroadcast() {
        let mut router = make_router();
        router
            .handle_rreq(&rreq(addr(7), addr(9), 4, 3), mac(0x07), IfIndex(2), 1000)
            .unwrap();
        let actions = router
            .handle_rreq(&rreq(addr(7), addr(9), 1, 3), mac(0x17), IfIndex(3), 1000)
            .unwrap();
        assert_eq!(broadcasts(&actions), 2);
        assert_eq!(router.routing_table().lookup(&addr(7)).unwrap().hopcnt, 2);
    }

    #[test]
    fn intermediate_with_route_replies_and_marks_reply_sent() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(9), mac(0x09), IfIndex(3), 2, 0, 1000);

        let actions = router
            .handle_rreq(&rreq(addr(7), addr(9), 0, 1), mac(0x07), IfIndex(2), 1000)
            .unwrap();

        let replies = unicasts(&actions);
        assert_eq!(replies.len(), 1);
        let (if_index, dest, frame) = &replies[0];
        assert_eq!((*if_index, *dest), (IfIndex(2), mac(0x07)));
        let reply = frame.route_packet().unwrap();
        assert_eq!(reply.dst, addr(9));
        assert_eq!(reply.src, addr(7));
        assert_eq!(reply.hopcnt, 2);

        assert_eq!(broadcasts(&actions), 2);
        for (_, dest, frame) in transmits(&actions) {
            if dest.is_broadcast() {
                assert!(frame.route_packet().unwrap().flags.reply_sent);
            }
        }
    }

    #[test]
    fn split_horizon_suppresses_reply_toward_next_hop() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(9), mac(0x07), IfIndex(2), 2, 0, 1000);

        let actions = router
            .handle_rreq(&rreq(addr(7), addr(9), 0, 1), mac(0x07), IfIndex(2), 1000)
            .unwrap();

        assert!(unicasts(&actions).is_empty());
        assert_eq!(broadcasts(&actions), 2);
    }

    #[test]
    fn reply_sent_flag_suppresses_duplicate_reply() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(9), mac(0x09), IfIndex(3), 2, 0, 1000);
        let mut packet = rreq(addr(7), addr(9), 1, 1);
        packet.flags.reply_sent = true;

        let actions = router
            .handle_rreq(&packet, mac(0x07), IfIndex(2), 1000)
            .unwrap();
        assert!(unicasts(&actions).is_empty());
        assert_eq!(broadcasts(&actions), 2);
    }

    #[test]
    fn forced_rreq_is_not_answered_by_intermediate() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(9), mac(0x09), IfIndex(3), 2, 0, 1000);
        let mut packet = rreq(addr(7), addr(9), 0, 1);
        packet.flags.forced = true;

        let actions = router
            .handle_rreq(&packet, mac(0x07), IfIndex(2), 1000)
            .unwrap();
        assert!(unicasts(&actions).is_empty());
        for (_, _, frame) in transmits(&actions) {
            assert!(frame.route_packet().unwrap().flags.forced);
        }
    }

    #[test]
    fn duplicate_rreq_for_self_gets_one_reply() {
        let mut router = make_router();
        let packet = rreq(addr(7), LOCAL, 0, 2);
        let first = router
            .handle_rreq(&packet, mac(0x07), IfIndex(2), 1000)
            .unwrap();
        let second = router
            .handle_rreq(&packet, mac(0x17), IfIndex(3), 1000)
            .unwrap();
        assert_eq!(unicasts(&first).len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn newer_flood_replaces_longer_reverse_route() {
        let mut router = make_router();
        router
            .handle_rreq(&rreq(addr(7), addr(9), 0, 1), mac(0x07), IfIndex(2), 1000)
            .unwrap();
        router
            .handle_rreq(&rreq(addr(7), addr(9), 3, 2), mac(0x17), IfIndex(3), 1001)
            .unwrap();
        let route = router.routing_table().lookup(&addr(7)).unwrap();
        assert_eq!(route.hopcnt, 4);
        assert_eq!(route.bcast_id, 2);
        assert_eq!(route.next_hop, mac(0x17));
    }

    // === Route replies ===

    #[test]
    fn rrep_at_requester_is_not_relayed() {
        let mut router = make_router();
        let rrep = RoutePacket {
            dst: addr(9),
            src: LOCAL,
            flags: RouteFlags::reply(false),
            hopcnt: 0,
            bcast_id: 1,
        };
        let actions = router.handle_rrep(&rrep, mac(0x09), IfIndex(3), 1000);
        assert!(actions.is_empty());
        assert!(router.queue().is_empty());
        assert_eq!(router.routing_table().lookup(&addr(9)).unwrap().hopcnt, 1);
    }

    #[test]
    fn rrep_is_relayed_along_reverse_route_toward_source() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(4), mac(0x04), IfIndex(2), 1, 5, 1000);
        let rrep = RoutePacket {
            dst: addr(9),
            src: addr(4),
            flags: RouteFlags::reply(false),
            hopcnt: 0,
            bcast_id: 5,
        };
        let actions = router.handle_rrep(&rrep, mac(0x09), IfIndex(3), 1000);

        let sent = unicasts(&actions);
        assert_eq!(sent.len(), 1);
        let (if_index, dest, frame) = &sent[0];
        assert_eq!((*if_index, *dest), (IfIndex(2), mac(0x04)));
        assert_eq!(frame.frame_type, FrameType::RouteReply);
        assert_eq!(frame.route_packet().unwrap().hopcnt, 1);
        assert!(router.queue().is_empty());
    }

    #[test]
    fn longer_rrep_does_not_replace_route() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(9), mac(0x09), IfIndex(3), 1, 7, 1000);
        let rrep = RoutePacket {
            dst: addr(9),
            src: LOCAL,
            flags: RouteFlags::reply(false),
            hopcnt: 1,
            bcast_id: 1,
        };
        router.handle_rrep(&rrep, mac(0x19), IfIndex(2), 1001);
        let route = router.routing_table().lookup(&addr(9)).unwrap();
        assert_eq!(route.next_hop, mac(0x09));
        assert_eq!(route.timestamp, 1000);
    }

    #[test]
    fn shorter_rrep_keeps_stored_bcast_id() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(9), mac(0x09), IfIndex(3), 4, 7, 1000);
        let rrep = RoutePacket {
            dst: addr(9),
            src: LOCAL,
            flags: RouteFlags::reply(false),
            hopcnt: 0,
            bcast_id: 1,
        };
        router.handle_rrep(&rrep, mac(0x19), IfIndex(2), 1001);
        let route = router.routing_table().lookup(&addr(9)).unwrap();
        assert_eq!(route.hopcnt, 1);
        assert_eq!(route.bcast_id, 7);
    }

    // === Application messages ===

    fn app(dst: NodeAddr, dst_port: u32, src: NodeAddr) -> AppPacket {
        AppPacket::new(dst, dst_port, src, 14600, b"hello").unwrap()
    }

    #[test]
    fn appmsg_for_self_is_delivered_by_port() {
        let mut router = make_router();
        let actions = router.handle_appmsg(&app(LOCAL, 14508, addr(6)), mac(0x06), IfIndex(2), 1000);

        assert_eq!(actions.len(), 1);
        let RouterAction::DeliverLocal { path, datagram } = &actions[0] else {
            panic!("expected local delivery");
        };
        assert_eq!(path, SERVER_PATH);
        assert_eq!(datagram.addr, addr(6));
        assert_eq!(datagram.port, 14600);
        assert_eq!(datagram.data(), b"hello");

        let learned = router.routing_table().lookup(&addr(6)).unwrap();
        assert_eq!(learned.hopcnt, 1);
        assert_eq!(learned.next_hop, mac(0x06));
    }

    #[test]
    fn appmsg_for_unbound_port_is_dropped() {
        let mut router = make_router();
        let actions = router.handle_appmsg(&app(LOCAL, 20000, addr(6)), mac(0x06), IfIndex(2), 1000);
        assert!(actions.is_empty());
    }

    #[test]
    fn transit_appmsg_is_forwarded_with_incremented_hopcnt() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(9), mac(0x09), IfIndex(3), 1, 0, 1000);
        let mut packet = app(addr(9), 14508, addr(6)).with_forced(true);
        packet.hopcnt = 2;

        let actions = router.handle_appmsg(&packet, mac(0x06), IfIndex(2), 1000);
        let sent = unicasts(&actions);
        assert_eq!(sent.len(), 1);
        let (if_index, dest, frame) = &sent[0];
        assert_eq!((*if_index, *dest), (IfIndex(3), mac(0x09)));
        let forwarded = frame.app_packet().unwrap();
        assert_eq!(forwarded.hopcnt, 3);
        assert!(forwarded.forced);
        assert_eq!(router.routing_table().lookup(&addr(9)).unwrap().next_hop, mac(0x09));
        assert_eq!(router.routing_table().lookup(&addr(6)).unwrap().hopcnt, 3);
    }

    #[test]
    fn local_request_to_self_is_delivered_without_frames() {
        let mut router = make_router();
        let actions = router
            .handle_local_request(CLIENT_PATH, &request(LOCAL, false), 1000)
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            RouterAction::DeliverLocal { path, datagram }
                if path == SERVER_PATH && datagram.port == 14509
        ));
    }

    #[test]
    fn local_request_accepts_full_capacity_payload() {
        let mut router = make_router();
        let full = OdrDatagram::new(addr(5), 14508, false, &[0x61; 48]).unwrap();
        assert!(router.handle_local_request(CLIENT_PATH, &full, 1000).is_ok());
        let QueuedPayload::AppMessage(packet) = &router.queue().head().unwrap().payload else {
            panic!("expected an application message");
        };
        assert_eq!(packet.data().len(), 48);
    }

    // === Queue ===

    #[test]
    fn blocked_head_gates_later_items_until_resolved() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(8), mac(0x08), IfIndex(2), 1, 0, 1000);

        router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();
        let actions = router
            .handle_local_request(CLIENT_PATH, &request(addr(8), false), 1000)
            .unwrap();
        assert!(unicasts(&actions).is_empty());
        assert_eq!(router.queue().len(), 2);

        let rrep = RoutePacket {
            dst: addr(5),
            src: LOCAL,
            flags: RouteFlags::reply(false),
            hopcnt: 0,
            bcast_id: 1,
        };
        let actions = router.handle_rrep(&rrep, mac(0x05), IfIndex(3), 1001);
        let sent = unicasts(&actions);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].2.app_packet().unwrap().dst, addr(5));
        assert_eq!(sent[1].2.app_packet().unwrap().dst, addr(8));
        assert!(router.queue().is_empty());
    }

    #[test]
    fn expired_head_is_dropped_and_next_item_serviced() {
        let mut router = make_router();
        router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();
        router
            .routing_table_mut()
            .insert_or_update(addr(8), mac(0x08), IfIndex(2), 1, 0, 1010);
        router
            .handle_local_request(CLIENT_PATH, &request(addr(8), false), 1010)
            .unwrap();
        assert_eq!(router.queue().len(), 2);

        let actions = router.drain_queue(1016);
        let sent = unicasts(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2.app_packet().unwrap().dst, addr(8));
        assert!(router.queue().is_empty());
    }

    #[test]
    fn item_is_kept_until_timeout_elapses() {
        let mut router = make_router();
        router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();
        router.drain_queue(1015);
        assert_eq!(router.queue().len(), 1);
        router.drain_queue(1016);
        assert!(router.queue().is_empty());
    }

    #[test]
    fn discovery_is_rate_limited_per_destination() {
        let mut router = make_router();
        let first = router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();
        assert_eq!(broadcasts(&first), 2);
        assert_eq!(broadcasts(&router.drain_queue(1000)), 0);
        let retry = router.drain_queue(1001);
        assert_eq!(broadcasts(&retry), 2);
        assert_eq!(router.current_bcast_id(), 2);
    }

    #[test]
    fn forced_request_drops_route_and_rediscovers() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(5), mac(0x55), IfIndex(3), 2, 0, 1000);

        let actions = router
            .handle_local_request(CLIENT_PATH, &request(addr(5), true), 1000)
            .unwrap();

        assert!(unicasts(&actions).is_empty());
        assert_eq!(broadcasts(&actions), 2);
        for (_, _, frame) in transmits(&actions) {
            assert!(frame.route_packet().unwrap().flags.forced);
        }
        assert!(router.routing_table().lookup(&addr(5)).is_none());
        assert_eq!(router.queue().len(), 1);
        assert!(!router.queue().head().unwrap().forced);

        let rrep = RoutePacket {
            dst: addr(5),
            src: LOCAL,
            flags: RouteFlags::reply(true),
            hopcnt: 0,
            bcast_id: 1,
        };
        let actions = router.handle_rrep(&rrep, mac(0x65), IfIndex(2), 1001);
        let sent = unicasts(&actions);
        assert_eq!(sent.len(), 1);
        let message = sent[0].2.app_packet().unwrap();
        assert!(message.forced);
        assert_eq!(sent[0].1, mac(0x65));
    }

    #[test]
    fn route_on_unknown_interface_is_removed() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(5), mac(0x55), IfIndex(42), 1, 0, 1000);
        let actions = router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();
        assert!(unicasts(&actions).is_empty());
        assert_eq!(broadcasts(&actions), 2);
        assert!(router.routing_table().lookup(&addr(5)).is_none());
    }

    #[test]
    fn send_rrep_without_reverse_route_is_an_error() {
        let router = make_router();
        let reply = RoutePacket {
            dst: LOCAL,
            src: addr(7),
            flags: RouteFlags::reply(false),
            hopcnt: 0,
            bcast_id: 1,
        };
        assert!(matches!(
            router.send_rrep(&reply),
            Err(RouterError::MissingReverseRoute(a)) if a == addr(7)
        ));
    }

    // === Frames, purge and debug ===

    #[test]
    fn malformed_frame_is_rejected_without_side_effects() {
        let mut router = make_router();
        let err = router
            .handle_frame(&[0u8; 20], mac(1), IfIndex(2), 1000)
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::PacketError(PacketError::TooShort { .. })
        ));
        assert!(router.routing_table().is_empty());
    }

    #[test]
    fn handle_frame_dispatches_rreq() {
        let mut router = make_router();
        let raw = Frame::route(HwAddr::BROADCAST, mac(0x07), &rreq(addr(7), LOCAL, 0, 1)).serialize();
        let actions = router.handle_frame(&raw, mac(0x07), IfIndex(2), 1000).unwrap();
        assert_eq!(unicasts(&actions).len(), 1);
    }

    #[test]
    fn frame_on_unmanaged_interface_leaves_flood_unseen() {
        let mut router = make_router();
        let raw = Frame::route(HwAddr::BROADCAST, mac(0x07), &rreq(addr(7), LOCAL, 0, 1)).serialize();

        let actions = router.handle_frame(&raw, mac(0x07), IfIndex(1), 1000).unwrap();
        assert!(actions.is_empty());
        assert!(router.routing_table().lookup(&addr(7)).is_none());
        assert!(router.bcast_ids().is_empty());

        let actions = router.handle_frame(&raw, mac(0x07), IfIndex(2), 1000).unwrap();
        let replies = unicasts(&actions);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, IfIndex(2));
        assert_eq!(replies[0].2.frame_type, FrameType::RouteReply);
        assert_eq!(
            router.routing_table().lookup(&addr(7)).unwrap().if_index,
            IfIndex(2)
        );
    }

    #[test]
    fn purge_expires_broadcast_ids_with_staleness() {
        let mut router = make_router();
        let staleness = router.config().staleness;
        router
            .handle_rreq(&rreq(addr(7), LOCAL, 0, 40), mac(0x07), IfIndex(2), 1000)
            .unwrap();
        assert_eq!(router.bcast_ids().get(&addr(7), &LOCAL), Some(40));

        router.purge(1000 + staleness);
        assert!(router.bcast_ids().is_empty());

        let actions = router
            .handle_rreq(&rreq(addr(7), LOCAL, 0, 1), mac(0x07), IfIndex(2), 1000 + staleness)
            .unwrap();
        assert_eq!(unicasts(&actions).len(), 1);
    }

    #[test]
    fn debug_frames_produce_no_actions() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(5), mac(0x55), IfIndex(3), 2, 9, 1000);
        for ty in [FrameType::RouteDebug, FrameType::DataDebug] {
            let raw = Frame::debug(HwAddr::BROADCAST, mac(1), ty, "dump").serialize();
            assert!(
                router
                    .handle_frame(&raw, mac(1), IfIndex(2), 1005)
                    .unwrap()
                    .is_empty()
            );
        }
        let dump = router.route_dump(1005);
        assert_eq!(dump.len(), 1);
        assert!(dump[0].contains("10.0.0.5"));
        assert!(dump[0].contains("02:00:00:00:00:55"));
        assert!(dump[0].contains("5s"));
    }

    #[test]
    fn purge_removes_stale_routes_and_idle_ports() {
        let mut router = make_router();
        router
            .routing_table_mut()
            .insert_or_update(addr(5), mac(0x55), IfIndex(3), 2, 0, 1000);
        router
            .handle_local_request(CLIENT_PATH, &request(addr(5), false), 1000)
            .unwrap();

        router.purge(1029);
        assert_eq!(router.routing_table().len(), 1);
        router.purge(1030);
        assert!(router.routing_table().is_empty());
        assert!(router.port_table().get(CLIENT_PATH).is_some());
        router.purge(1301);
        assert!(router.port_table().get(CLIENT_PATH).is_none());
        assert!(router.port_table().get(SERVER_PATH).is_some());
    }

    // === Multi-node ===

    /// Routers connected by shared segments; frames are delivered to every
    /// other interface on the segment whose address matches or is broadcast.
    struct Network {
        nodes: Vec<OdrRouter>,
        /// (node, if_index, hw_addr, segment)
        links: Vec<(usize, IfIndex, HwAddr, u8)>,
        delivered: Vec<(usize, String, OdrDatagram)>,
    }

    impl Network {
        fn line() -> Self {
            // A(1) --seg0-- B(2) --seg1-- C(3)
            let a = OdrRouter::new(
                config(addr(1)),
                InterfaceTable::new(vec![iface(2, mac(0x12))]),
            );
            let b = OdrRouter::new(
                config(addr(2)),
                InterfaceTable::new(vec![iface(2, mac(0x22)), iface(3, mac(0x23))]),
            );
            let c = OdrRouter::new(
                config(addr(3)),
                InterfaceTable::new(vec![iface(2, mac(0x32))]),
            );
            Self {
                nodes: vec![a, b, c],
                links: vec![
                    (0, IfIndex(2), mac(0x12), 0),
                    (1, IfIndex(2), mac(0x22), 0),
                    (1, IfIndex(3), mac(0x23), 1),
                    (2, IfIndex(2), mac(0x32), 1),
                ],
                delivered: Vec::new(),
            }
        }

        fn run(&mut self, origin: usize, actions: Vec<RouterAction>, now: u64) {
            let mut pending: Vec<(usize, RouterAction)> =
                actions.into_iter().map(|a| (origin, a)).collect();
            let mut steps = 0;
            while let Some((from, action)) = pending.pop() {
                steps += 1;
                assert!(steps < 1000, "network did not settle");
                match action {
                    RouterAction::DeliverLocal { path, datagram } => {
                        self.delivered.push((from, path, datagram));
                    }
                    RouterAction::Transmit {
                        if_index,
                        dest,
                        frame,
                    } => {
                        let (_, _, src_hw, segment) = *self
                            .links
                            .iter()
                            .find(|(n, i, _, _)| *n == from && *i == if_index)
                            .unwrap();
                        let receivers: Vec<_> = self
                            .links
                            .iter()
                            .filter(|(n, _, hw, seg)| {
                                *seg == segment && *n != from && (dest.is_broadcast() || *hw == dest)
                            })
                            .map(|(n, i, _, _)| (*n, *i))
                            .collect();
                        for (node, rx_if) in receivers {
                            let out = self.nodes[node]
                                .handle_frame(&frame, src_hw, rx_if, now)
                                .unwrap();
                            pending.extend(out.into_iter().map(|a| (node, a)));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn line_topology_request_and_response() {
        let mut net = Network::line();

        let request = OdrDatagram::new(addr(3), 14508, false, b"time?").unwrap();
        let actions = net.nodes[0]
            .handle_local_request(CLIENT_PATH, &request, 1000)
            .unwrap();
        net.run(0, actions, 1000);

        assert_eq!(net.delivered.len(), 1);
        let (node, path, datagram) = net.delivered.remove(0);
        assert_eq!(node, 2);
        assert_eq!(path, SERVER_PATH);
        assert_eq!(datagram.addr, addr(1));
        assert_eq!(datagram.data(), b"time?");
        assert!(net.nodes[0].queue().is_empty());
        assert_eq!(net.nodes[0].routing_table().lookup(&addr(3)).unwrap().hopcnt, 2);

        let reply = OdrDatagram::new(datagram.addr, datagram.port, false, b"12:00").unwrap();
        let actions = net.nodes[2]
            .handle_local_request(SERVER_PATH, &reply, 1001)
            .unwrap();
        assert!(
            actions
                .iter()
                .all(|a| matches!(a, RouterAction::Transmit { dest, .. } if !dest.is_broadcast())),
            "reply should follow the learned reverse route"
        );
        net.run(2, actions, 1001);

        assert_eq!(net.delivered.len(), 1);
        let (node, path, datagram) = &net.delivered[0];
        assert_eq!(*node, 0);
        assert_eq!(path, CLIENT_PATH);
        assert_eq!(datagram.addr, addr(3));
        assert_eq!(datagram.port, 14508);
        assert_eq!(datagram.data(), b"12:00");
    }
}
