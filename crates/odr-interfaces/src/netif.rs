//! Network interface enumeration.
//!
//! Wraps `getifaddrs` to list the Ethernet interfaces ODR can send frames on,
//! together with their hardware address, index and IPv4 address.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use odr_core::types::{HwAddr, IfIndex};
use odr_transport::interfaces::InterfaceEntry;
use tracing::debug;

use crate::error::InterfaceError;

/// Per-name accumulator while walking the address list.
#[derive(Debug, Default)]
struct Collected {
    hw_addr: Option<HwAddr>,
    ip: Option<Ipv4Addr>,
}

/// Enumerate interfaces with a hardware address, skipping `ignored` names.
///
/// Alias interfaces (`eth1:1`) inherit the hardware address and index of
/// their parent and are flagged with `alias`. Result is sorted by index,
/// parents before their aliases.
pub fn enumerate_interfaces(ignored: &[String]) -> Result<Vec<InterfaceEntry>, InterfaceError> {
    let addrs = nix::ifaddrs::getifaddrs().map_err(std::io::Error::other)?;

    let mut seen: BTreeMap<String, Collected> = BTreeMap::new();
    for ifaddr in addrs {
        let Some(address) = ifaddr.address else {
            continue;
        };
        let slot = seen.entry(ifaddr.interface_name.clone()).or_default();
        if let Some(link) = address.as_link_addr()
            && let Some(mac) = link.addr()
        {
            slot.hw_addr.get_or_insert(HwAddr::new(mac));
        }
        if let Some(sin) = address.as_sockaddr_in() {
            slot.ip.get_or_insert(Ipv4Addr::from(sin.ip()));
        }
    }

    let mut result = Vec::new();
    for (name, collected) in &seen {
        let base = parent_name(name);
        if ignored.iter().any(|i| i == name || i == base) {
            continue;
        }
        let alias = base != name.as_str();
        let hw_addr = match (collected.hw_addr, alias) {
            (Some(mac), _) => mac,
            (None, true) => match seen.get(base).and_then(|p| p.hw_addr) {
                Some(mac) => mac,
                None => continue,
            },
            (None, false) => continue,
        };
        let if_index = nix::net::if_::if_nametoindex(base).map_err(std::io::Error::other)?;
        let if_index = i32::try_from(if_index)
            .map_err(|_| InterfaceError::Configuration(format!("index {if_index} out of range")))?;
        result.push(InterfaceEntry {
            name: name.clone(),
            hw_addr,
            if_index: IfIndex(if_index),
            ip: collected.ip,
            alias,
        });
    }

    result.sort_by(|a, b| (a.if_index, a.alias).cmp(&(b.if_index, b.alias)));
    for entry in &result {
        debug!(
            name = %entry.name,
            hw_addr = %entry.hw_addr,
            if_index = %entry.if_index,
            ip = ?entry.ip,
            alias = entry.alias,
            "interface discovered"
        );
    }
    Ok(result)
}

/// IPv4 address of the named interface, used as this node's identity.
pub fn canonical_address(name: &str) -> Result<Ipv4Addr, InterfaceError> {
    let addrs = nix::ifaddrs::getifaddrs().map_err(std::io::Error::other)?;
    addrs
        .filter(|ifaddr| ifaddr.interface_name == name)
        .find_map(|ifaddr| {
            ifaddr
                .address
                .and_then(|a| a.as_sockaddr_in().map(|sin| Ipv4Addr::from(sin.ip())))
        })
        .ok_or_else(|| InterfaceError::NotFound(name.to_string()))
}

/// Interface entries to route over: aliases dropped so each physical link is
/// used once.
pub fn routable(entries: Vec<InterfaceEntry>) -> Vec<InterfaceEntry> {
    entries.into_iter().filter(|e| !e.alias).collect()
}

/// `eth1:1` -> `eth1`.
fn parent_name(name: &str) -> &str {
    name.split(':').next().unwrap_or(name)
}
