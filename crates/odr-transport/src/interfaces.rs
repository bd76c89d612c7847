//! Read-only snapshot of the local interfaces the router sends on.

use std::net::Ipv4Addr;

use odr_core::types::{HwAddr, IfIndex};

/// One local network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub name: String,
    pub hw_addr: HwAddr,
    pub if_index: IfIndex,
    pub ip: Option<Ipv4Addr>,
    /// Set for `name:N` alias interfaces.
    pub alias: bool,
}

/// Interfaces available for broadcast and unicast, looked up by index.
#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    entries: Vec<InterfaceEntry>,
}

impl InterfaceTable {
    pub fn new(entries: Vec<InterfaceEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, if_index: IfIndex) -> Option<&InterfaceEntry> {
        self.entries.iter().find(|e| e.if_index == if_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.entries.iter()
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
