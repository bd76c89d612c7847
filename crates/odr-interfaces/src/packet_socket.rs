//! Raw `AF_PACKET` socket carrying frames of a single link-layer protocol.
//!
//! One socket serves every local interface: outbound frames pick their
//! interface through the `sockaddr_ll` destination, inbound frames report the
//! interface they arrived on. Frames this host transmitted are looped back by
//! the kernel as `PACKET_OUTGOING` and are filtered out here.

use std::io;
use std::mem;

use odr_core::constants::{FRAME_LEN, HWADDR_LEN};
use odr_core::types::{HwAddr, IfIndex};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tracing::{debug, trace};

use crate::error::InterfaceError;
use crate::traits::{FrameTransport, ReceivedFrame};

/// Receive buffer size. Large enough for any Ethernet frame, so oversized
/// foreign frames are read whole and rejected by the frame parser.
const RECV_BUF_LEN: usize = 1518;

/// Async raw packet socket bound to one EtherType.
pub struct PacketSocket {
    inner: AsyncFd<Socket>,
    protocol: u16,
}

impl PacketSocket {
    /// Open a non-blocking raw socket receiving frames of `protocol`.
    ///
    /// Requires `CAP_NET_RAW`. Must be called from within a tokio runtime.
    pub fn open(protocol: u16) -> Result<Self, InterfaceError> {
        let socket = Socket::new(
            Domain::PACKET,
            Type::RAW,
            Some(Protocol::from(i32::from(protocol.to_be()))),
        )?;
        socket.set_nonblocking(true)?;
        let inner = AsyncFd::new(socket)?;
        debug!(protocol = format_args!("{protocol:#06x}"), "packet socket opened");
        Ok(Self { inner, protocol })
    }

    pub fn protocol(&self) -> u16 {
        self.protocol
    }

    async fn recv_raw(&self) -> io::Result<(Vec<u8>, SockAddr)> {
        let mut data: Vec<u8> = Vec::with_capacity(RECV_BUF_LEN);
        let (len, addr) = self
            .inner
            .async_io(Interest::READABLE, |sock| {
                sock.recv_from(data.spare_capacity_mut())
            })
            .await?;
        // SAFETY: recv_from initialized the first `len` bytes of the spare capacity.
        unsafe { data.set_len(len) };
        Ok((data, addr))
    }
}

impl FrameTransport for PacketSocket {
    async fn send_frame(
        &self,
        if_index: IfIndex,
        dest: HwAddr,
        frame: &[u8],
    ) -> Result<usize, InterfaceError> {
        let addr = link_addr(self.protocol, if_index, dest);
        let sent = self
            .inner
            .async_io(Interest::WRITABLE, |sock| sock.send_to(frame, &addr))
            .await?;
        trace!(%if_index, %dest, bytes = sent, "frame sent");
        Ok(sent)
    }

    async fn recv_frame(&self) -> Result<ReceivedFrame, InterfaceError> {
        loop {
            let (data, addr) = self.recv_raw().await?;
            let Some(origin) = LinkOrigin::from_sockaddr(&addr) else {
                continue;
            };
            if origin.outgoing {
                continue;
            }
            if data.len() < FRAME_LEN {
                trace!(bytes = data.len(), if_index = %origin.if_index, "runt frame dropped");
                continue;
            }
            return Ok(ReceivedFrame {
                data,
                sender: origin.sender,
                if_index: origin.if_index,
            });
        }
    }
}

/// Link-level metadata the kernel attaches to a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkOrigin {
    sender: HwAddr,
    if_index: IfIndex,
    outgoing: bool,
}

impl LinkOrigin {
    fn from_sockaddr(addr: &SockAddr) -> Option<Self> {
        if i32::from(addr.family()) != libc::AF_PACKET {
            return None;
        }
        if (addr.len() as usize) < mem::size_of::<libc::sockaddr_ll>() {
            return None;
        }
        // SAFETY: family is AF_PACKET and the address is long enough to be a
        // sockaddr_ll; SockAddr storage is suitably aligned.
        let sll = unsafe { &*addr.as_ptr().cast::<libc::sockaddr_ll>() };
        let mut mac = [0u8; HWADDR_LEN];
        mac.copy_from_slice(&sll.sll_addr[..HWADDR_LEN]);
        Some(Self {
            sender: HwAddr::new(mac),
            if_index: IfIndex(sll.sll_ifindex),
            outgoing: sll.sll_pkttype == libc::PACKET_OUTGOING,
        })
    }
}

/// Destination address for a frame leaving through `if_index`.
fn link_addr(protocol: u16, if_index: IfIndex, dest: HwAddr) -> SockAddr {
    // SAFETY: all-zero is a valid sockaddr_storage.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    {
        // SAFETY: sockaddr_storage is large and aligned enough for any sockaddr.
        let sll = unsafe {
            &mut *(&mut storage as *mut libc::sockaddr_storage).cast::<libc::sockaddr_ll>()
        };
        sll.sll_family = libc::AF_PACKET as libc::sa_family_t;
        sll.sll_protocol = protocol.to_be();
        sll.sll_ifindex = if_index.0;
        sll.sll_halen = HWADDR_LEN as u8;
        sll.sll_addr[..HWADDR_LEN].copy_from_slice(dest.as_ref());
    }
    let len = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;
    // SAFETY: storage holds an initialized sockaddr_ll of `len` bytes.
    unsafe { SockAddr::new(storage, len) }
}
