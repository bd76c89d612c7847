//! Hostname to node address mapping for the applications.

use std::collections::BTreeMap;

use odr_core::types::NodeAddr;

use crate::error::NodeError;

/// Static host table built from the `[hosts]` config section.
#[derive(Debug, Clone, Default)]
pub struct HostTable {
    by_name: BTreeMap<String, NodeAddr>,
}

impl HostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from name/address pairs, validating every address.
    pub fn from_config(hosts: &BTreeMap<String, String>) -> Result<Self, NodeError> {
        let mut table = Self::new();
        for (name, addr) in hosts {
            let addr = addr
                .parse::<NodeAddr>()
                .map_err(|e| NodeError::Config(format!("host {name}: {e}")))?;
            table.insert(name.clone(), addr);
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: String, addr: NodeAddr) {
        self.by_name.insert(name, addr);
    }

    /// Address for `name`. A dotted quad resolves to itself.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<NodeAddr> {
        self.by_name
            .get(name)
            .copied()
            .or_else(|| name.parse().ok())
    }

    /// Hostname for `addr`, or the address itself when unknown.
    pub fn name_of(&self, addr: NodeAddr) -> String {
        self.by_name
            .iter()
            .find(|(_, a)| **a == addr)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| addr.to_string())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
