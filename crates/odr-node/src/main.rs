use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use odr_core::constants::PROTOCOL_ID;
use odr_core::types::NodeAddr;
use odr_interfaces::PacketSocket;
use odr_interfaces::netif::{canonical_address, enumerate_interfaces, routable};
use odr_node::{Node, NodeConfig, NodeError};
use odr_transport::interfaces::InterfaceTable;

#[derive(Parser)]
#[command(name = "odr-node", about = "On-demand routing daemon")]
struct Cli {
    /// Route lifetime in seconds
    staleness: u64,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match NodeConfig::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };
    if cli.staleness == 0 {
        eprintln!("staleness must be positive");
        std::process::exit(1);
    }
    config.node.staleness = cli.staleness;

    odr_node::logging::init_from_env(&config.logging.level);

    let mut node = match build_node(&config) {
        Ok(node) => node,
        Err(e) => {
            tracing::error!("failed to start node: {e}");
            std::process::exit(1);
        }
    };
    let handle = node.shutdown_handle();

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received SIGINT, shutting down");
        handle.shutdown();
    });

    if let Err(e) = node.start() {
        tracing::error!("failed to start node: {e}");
        std::process::exit(1);
    }

    node.run().await;
    node.shutdown().await;
}

fn build_node(config: &NodeConfig) -> Result<Node<PacketSocket>, NodeError> {
    let local_addr = match config.local_address()? {
        Some(addr) => addr,
        None => NodeAddr::from(canonical_address(&config.node.canonical_interface)?),
    };
    let entries = routable(enumerate_interfaces(&config.node.ignore_interfaces)?);
    let transport = PacketSocket::open(PROTOCOL_ID)?;
    Node::new(
        config.router_config(local_addr),
        InterfaceTable::new(entries),
        transport,
        Path::new(&config.ipc.odr_path),
        Duration::from_millis(config.node.maintenance_interval_ms),
    )
}
