//! Router types.

use odr_core::datagram::OdrDatagram;
use odr_core::types::{HwAddr, IfIndex, NodeAddr, Port};

use crate::discovery::DEFAULT_RREQ_MIN_INTERVAL;
use crate::port::{DEFAULT_PORT_TTL, DEFAULT_TIME_SERVER_PATH, TIME_SERVER_PORT};
use crate::queue::DEFAULT_QUEUE_TIMEOUT;
use crate::route::DEFAULT_STALENESS;

/// Action returned by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    /// Transmit a frame on an interface to a neighbour (or to broadcast).
    Transmit {
        if_index: IfIndex,
        dest: HwAddr,
        frame: Vec<u8>,
    },
    /// Hand a datagram to the local endpoint bound at `path`.
    DeliverLocal { path: String, datagram: OdrDatagram },
}

/// Router parameters. All durations are in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub local_addr: NodeAddr,
    pub staleness: u64,
    pub queue_timeout: u64,
    pub port_ttl: u64,
    pub rreq_min_interval: u64,
    pub time_server_path: String,
    pub time_server_port: Port,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            local_addr: NodeAddr::UNSPECIFIED,
            staleness: DEFAULT_STALENESS,
            queue_timeout: DEFAULT_QUEUE_TIMEOUT,
            port_ttl: DEFAULT_PORT_TTL,
            rreq_min_interval: DEFAULT_RREQ_MIN_INTERVAL,
            time_server_path: DEFAULT_TIME_SERVER_PATH.to_string(),
            time_server_port: TIME_SERVER_PORT,
        }
    }
}
