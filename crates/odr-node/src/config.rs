//! TOML-based configuration for the daemon and applications.
//!
//! Every section and field is optional; an empty file yields the defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use odr_core::types::{NodeAddr, Port};
use odr_transport::discovery::DEFAULT_RREQ_MIN_INTERVAL;
use odr_transport::port::{DEFAULT_PORT_TTL, DEFAULT_TIME_SERVER_PATH, TIME_SERVER_PORT};
use odr_transport::queue::DEFAULT_QUEUE_TIMEOUT;
use odr_transport::route::DEFAULT_STALENESS;
use odr_transport::router::RouterConfig;

use crate::error::NodeError;

/// Default path of the daemon's IPC socket.
pub const DEFAULT_ODR_PATH: &str = "/tmp/14508-61375-timeODR";
/// Default prefix for client IPC sockets.
pub const DEFAULT_CLIENT_PATH_PREFIX: &str = "/tmp/14508-61375-timeClient-";

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub ipc: IpcSection,
    #[serde(default)]
    pub logging: LoggingSection,
    /// Hostname to dotted-quad address.
    #[serde(default)]
    pub hosts: BTreeMap<String, String>,
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("failed to read config file: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, NodeError> {
        let config: Self =
            toml::from_str(s).map_err(|e| NodeError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, NodeError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), NodeError> {
        if self.node.staleness == 0 {
            return Err(NodeError::Config("staleness must be positive".into()));
        }
        if self.node.maintenance_interval_ms == 0 {
            return Err(NodeError::Config(
                "maintenance_interval_ms must be positive".into(),
            ));
        }
        if let Some(addr) = &self.node.local_address {
            addr.parse::<NodeAddr>()
                .map_err(|e| NodeError::Config(format!("local_address: {e}")))?;
        }
        Ok(())
    }

    /// Configured local address, if any.
    pub fn local_address(&self) -> Result<Option<NodeAddr>, NodeError> {
        self.node
            .local_address
            .as_deref()
            .map(|s| {
                s.parse::<NodeAddr>()
                    .map_err(|e| NodeError::Config(format!("local_address: {e}")))
            })
            .transpose()
    }

    /// Routing engine parameters for a node identified by `local_addr`.
    pub fn router_config(&self, local_addr: NodeAddr) -> RouterConfig {
        RouterConfig {
            local_addr,
            staleness: self.node.staleness,
            queue_timeout: self.node.queue_timeout,
            port_ttl: self.node.port_ttl,
            rreq_min_interval: self.node.rreq_min_interval,
            time_server_path: self.ipc.time_server_path.clone(),
            time_server_port: self.ipc.time_server_port,
        }
    }
}

/// The `[node]` section.
#[derive(Debug, Deserialize)]
pub struct NodeSection {
    /// Route lifetime in seconds. Overridden by the daemon's positional argument.
    #[serde(default = "default_staleness")]
    pub staleness: u64,
    /// Node identity. Read from `canonical_interface` when unset.
    pub local_address: Option<String>,
    #[serde(default = "default_canonical_interface")]
    pub canonical_interface: String,
    #[serde(default = "default_ignore_interfaces")]
    pub ignore_interfaces: Vec<String>,
    #[serde(default = "default_queue_timeout")]
    pub queue_timeout: u64,
    #[serde(default = "default_port_ttl")]
    pub port_ttl: u64,
    #[serde(default = "default_rreq_min_interval")]
    pub rreq_min_interval: u64,
    #[serde(default = "default_maintenance_interval_ms")]
    pub maintenance_interval_ms: u64,
}

fn default_staleness() -> u64 {
    DEFAULT_STALENESS
}

fn default_canonical_interface() -> String {
    "eth0".to_string()
}

fn default_ignore_interfaces() -> Vec<String> {
    vec!["lo".to_string(), "eth0".to_string()]
}

fn default_queue_timeout() -> u64 {
    DEFAULT_QUEUE_TIMEOUT
}

fn default_port_ttl() -> u64 {
    DEFAULT_PORT_TTL
}

fn default_rreq_min_interval() -> u64 {
    DEFAULT_RREQ_MIN_INTERVAL
}

fn default_maintenance_interval_ms() -> u64 {
    1000
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            staleness: default_staleness(),
            local_address: None,
            canonical_interface: default_canonical_interface(),
            ignore_interfaces: default_ignore_interfaces(),
            queue_timeout: default_queue_timeout(),
            port_ttl: default_port_ttl(),
            rreq_min_interval: default_rreq_min_interval(),
            maintenance_interval_ms: default_maintenance_interval_ms(),
        }
    }
}

/// The `[ipc]` section.
#[derive(Debug, Deserialize)]
pub struct IpcSection {
    #[serde(default = "default_odr_path")]
    pub odr_path: String,
    #[serde(default = "default_time_server_path")]
    pub time_server_path: String,
    #[serde(default = "default_time_server_port")]
    pub time_server_port: Port,
    #[serde(default = "default_client_path_prefix")]
    pub client_path_prefix: String,
}

fn default_odr_path() -> String {
    DEFAULT_ODR_PATH.to_string()
}

fn default_time_server_path() -> String {
    DEFAULT_TIME_SERVER_PATH.to_string()
}

fn default_time_server_port() -> Port {
    TIME_SERVER_PORT
}

fn default_client_path_prefix() -> String {
    DEFAULT_CLIENT_PATH_PREFIX.to_string()
}

impl Default for IpcSection {
    fn default() -> Self {
        Self {
            odr_path: default_odr_path(),
            time_server_path: default_time_server_path(),
            time_server_port: default_time_server_port(),
            client_path_prefix: default_client_path_prefix(),
        }
    }
}

/// The `[logging]` section.
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
