//! In-memory link segments for tests and simulations.
//!
//! A [`MemorySegment`] behaves like a shared Ethernet: every frame sent onto
//! it is delivered to each other attached port whose hardware address
//! matches the destination, or to all of them for broadcast. A
//! [`MemoryTransport`] is one host's set of ports, possibly spanning several
//! segments, and implements [`FrameTransport`] so a full node can run
//! against it without raw sockets.
//!
//! # Usage
//!
//! ```rust,ignore
//! use odr_interfaces::testing::{MemorySegment, MemoryTransport};
//!
//! let lan = MemorySegment::new();
//! let mut a = MemoryTransport::new();
//! a.attach(&lan, IfIndex(2), mac_a);
//! let mut b = MemoryTransport::new();
//! b.attach(&lan, IfIndex(2), mac_b);
//! ```

use std::sync::{Arc, Mutex};

use odr_core::types::{HwAddr, IfIndex};
use odr_transport::interfaces::InterfaceEntry;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::InterfaceError;
use crate::traits::{FrameTransport, ReceivedFrame};

struct Port {
    hw_addr: HwAddr,
    if_index: IfIndex,
    tx: mpsc::UnboundedSender<ReceivedFrame>,
}

/// A shared broadcast medium.
#[derive(Default)]
pub struct MemorySegment {
    ports: Mutex<Vec<Port>>,
}

impl MemorySegment {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of attached ports.
    pub fn len(&self) -> usize {
        self.ports.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unplug the port with `hw_addr`. Frames to or from it are no longer
    /// carried. Returns whether a port was removed.
    pub fn detach(&self, hw_addr: HwAddr) -> bool {
        let Ok(mut ports) = self.ports.lock() else {
            return false;
        };
        let before = ports.len();
        ports.retain(|p| p.hw_addr != hw_addr);
        ports.len() != before
    }

    fn attach(&self, port: Port) {
        if let Ok(mut ports) = self.ports.lock() {
            ports.push(port);
        }
    }

    fn is_attached(&self, hw_addr: HwAddr) -> bool {
        self.ports
            .lock()
            .map(|ports| ports.iter().any(|p| p.hw_addr == hw_addr))
            .unwrap_or(false)
    }

    /// Deliver `frame` from `sender` to matching ports. Returns the number of
    /// receivers.
    fn carry(&self, sender: HwAddr, dest: HwAddr, frame: &[u8]) -> usize {
        let Ok(mut ports) = self.ports.lock() else {
            return 0;
        };
        // Receivers whose transport was dropped are pruned on the way.
        ports.retain(|p| !p.tx.is_closed());
        let mut delivered = 0;
        for port in ports.iter() {
            if port.hw_addr == sender {
                continue;
            }
            if !dest.is_broadcast() && dest != port.hw_addr {
                continue;
            }
            let received = ReceivedFrame {
                data: frame.to_vec(),
                sender,
                if_index: port.if_index,
            };
            if port.tx.send(received).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

struct Attachment {
    if_index: IfIndex,
    hw_addr: HwAddr,
    segment: Arc<MemorySegment>,
}

/// One host's ports onto in-memory segments.
pub struct MemoryTransport {
    attachments: Vec<Attachment>,
    tx: mpsc::UnboundedSender<ReceivedFrame>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ReceivedFrame>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            attachments: Vec::new(),
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Plug a new port with `hw_addr` into `segment` as interface `if_index`.
    pub fn attach(&mut self, segment: &Arc<MemorySegment>, if_index: IfIndex, hw_addr: HwAddr) {
        segment.attach(Port {
            hw_addr,
            if_index,
            tx: self.tx.clone(),
        });
        self.attachments.push(Attachment {
            if_index,
            hw_addr,
            segment: Arc::clone(segment),
        });
    }

    /// Interface entries describing the attached ports, for the router.
    pub fn interface_entries(&self) -> Vec<InterfaceEntry> {
        self.attachments
            .iter()
            .map(|a| InterfaceEntry {
                name: format!("mem{}", a.if_index),
                hw_addr: a.hw_addr,
                if_index: a.if_index,
                ip: None,
                alias: false,
            })
            .collect()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTransport for MemoryTransport {
    async fn send_frame(
        &self,
        if_index: IfIndex,
        dest: HwAddr,
        frame: &[u8],
    ) -> Result<usize, InterfaceError> {
        let attachment = self
            .attachments
            .iter()
            .find(|a| a.if_index == if_index)
            .ok_or_else(|| InterfaceError::NotFound(format!("index {if_index}")))?;
        if !attachment.segment.is_attached(attachment.hw_addr) {
            // Unplugged ports drop frames silently, like a dead link.
            return Ok(frame.len());
        }
        let receivers = attachment.segment.carry(attachment.hw_addr, dest, frame);
        trace!(%if_index, %dest, receivers, "memory frame sent");
        Ok(frame.len())
    }

    async fn recv_frame(&self) -> Result<ReceivedFrame, InterfaceError> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(InterfaceError::Closed)
    }
}
