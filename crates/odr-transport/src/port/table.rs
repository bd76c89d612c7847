//! Port table keyed by local IPC path.

use std::collections::HashMap;

use odr_core::types::Port;

use super::constants::EPHEMERAL_PORT_SPAN;
use crate::error::RouterError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub port: Port,
    /// Seconds since epoch of the last contact. Unused for permanent entries.
    pub timestamp: u64,
    pub permanent: bool,
}

impl PortEntry {
    /// Uses strict `>` comparison. Permanent entries never expire.
    #[must_use]
    pub fn is_expired(&self, now: u64, ttl: u64) -> bool {
        !self.permanent && now.saturating_sub(self.timestamp) > ttl
    }
}

/// Maps local IPC paths to ports so inbound messages can be handed back to
/// the endpoint that sent the request.
///
/// One permanent entry for the well-known service is created up front.
/// Ephemeral ports are taken from the range just above the well-known port,
/// wrapping back to its start and skipping ports still held by live entries.
#[must_use]
pub struct PortTable {
    entries: HashMap<String, PortEntry>,
    first_port: Port,
    last_port: Port,
    next_port: Port,
}

impl PortTable {
    pub fn new(permanent_path: impl Into<String>, permanent_port: Port) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            permanent_path.into(),
            PortEntry {
                port: permanent_port,
                timestamp: 0,
                permanent: true,
            },
        );
        let first_port = permanent_port + 1;
        Self {
            entries,
            first_port,
            last_port: permanent_port + EPHEMERAL_PORT_SPAN,
            next_port: first_port,
        }
    }

    /// Return the port for `path`, refreshing its entry, or allocate one.
    pub fn get_or_create_port(&mut self, path: &str, now: u64) -> Result<Port, RouterError> {
        if let Some(entry) = self.entries.get_mut(path) {
            if !entry.permanent {
                entry.timestamp = now;
            }
            return Ok(entry.port);
        }

        let port = self.allocate()?;
        self.entries.insert(
            path.to_string(),
            PortEntry {
                port,
                timestamp: now,
                permanent: false,
            },
        );
        tracing::debug!(path, port, "allocated port");
        Ok(port)
    }

    fn allocate(&mut self) -> Result<Port, RouterError> {
        let span = self.last_port - self.first_port + 1;
        for _ in 0..span {
            let candidate = self.next_port;
            self.next_port = if candidate >= self.last_port {
                self.first_port
            } else {
                candidate + 1
            };
            if !self.entries.values().any(|e| e.port == candidate) {
                return Ok(candidate);
            }
        }
        Err(RouterError::PortsExhausted)
    }

    /// Path registered for `port`, if any.
    #[must_use]
    pub fn lookup_by_port(&self, port: Port) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, e)| e.port == port)
            .map(|(path, _)| path.as_str())
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&PortEntry> {
        self.entries.get(path)
    }

    /// Remove ephemeral entries idle for longer than `ttl`.
    ///
    /// Returns the number of entries removed.
    pub fn purge(&mut self, now: u64, ttl: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - self.entries.len()
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
