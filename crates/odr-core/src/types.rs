//! Newtype wrappers for addresses carried in frames and tables.
//!
//! These keep hardware addresses, node addresses, interface indices and
//! ports from being mixed up even though several share a representation.

use core::fmt;
use core::str::FromStr;
use std::net::Ipv4Addr;

use crate::constants::HWADDR_LEN;
use crate::error::{InvalidLength, PacketError};

/// A 6-byte link-layer hardware address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[must_use]
pub struct HwAddr(pub(crate) [u8; HWADDR_LEN]);

impl HwAddr {
    /// ff:ff:ff:ff:ff:ff
    pub const BROADCAST: HwAddr = HwAddr([0xff; HWADDR_LEN]);

    pub const fn new(bytes: [u8; HWADDR_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn octets(&self) -> [u8; HWADDR_LEN] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl AsRef<[u8]> for HwAddr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for HwAddr {
    type Error = InvalidLength;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; HWADDR_LEN] = bytes.try_into().map_err(|_| InvalidLength {
            expected: HWADDR_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for HwAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for HwAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HwAddr({self})")
    }
}

/// A node address: an IPv4 dotted quad.
///
/// On the wire this is a null-padded string; internally it is validated
/// once at decode time and never re-parsed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct NodeAddr(Ipv4Addr);

impl NodeAddr {
    pub const UNSPECIFIED: NodeAddr = NodeAddr(Ipv4Addr::UNSPECIFIED);

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self(Ipv4Addr::new(a, b, c, d))
    }

    pub const fn ip(&self) -> Ipv4Addr {
        self.0
    }
}

impl From<Ipv4Addr> for NodeAddr {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip)
    }
}

impl FromStr for NodeAddr {
    type Err = PacketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv4Addr>()
            .map(Self)
            .map_err(|_| PacketError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeAddr({})", self.0)
    }
}

/// OS interface index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IfIndex(pub i32);

impl fmt::Display for IfIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Application port used to demultiplex local IPC endpoints.
pub type Port = u32;
