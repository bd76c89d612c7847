//! Ask neighbours to dump their routing tables.
//!
//! Broadcasts a route-debug frame, and optionally a data-debug frame with
//! free text, on every routable interface.

use std::path::PathBuf;

use clap::Parser;

use odr_core::constants::{FrameType, PROTOCOL_ID};
use odr_core::packet::Frame;
use odr_core::types::HwAddr;
use odr_interfaces::netif::{enumerate_interfaces, routable};
use odr_interfaces::{FrameTransport, InterfaceError, PacketSocket};
use odr_node::NodeConfig;

#[derive(Parser)]
#[command(name = "route-probe", about = "Trigger routing table dumps on neighbours")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text to send in a data-debug frame
    #[arg(short, long)]
    data: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match NodeConfig::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };
    odr_node::logging::init_from_env(&config.logging.level);

    if let Err(e) = probe(&config, cli.data.as_deref()).await {
        tracing::error!("probe failed: {e}");
        std::process::exit(1);
    }
}

async fn probe(config: &NodeConfig, data: Option<&str>) -> Result<(), InterfaceError> {
    let entries = routable(enumerate_interfaces(&config.node.ignore_interfaces)?);
    if entries.is_empty() {
        return Err(InterfaceError::Configuration("no usable interfaces".into()));
    }
    let socket = PacketSocket::open(PROTOCOL_ID)?;

    for entry in &entries {
        let mut frames = vec![Frame::debug(
            HwAddr::BROADCAST,
            entry.hw_addr,
            FrameType::RouteDebug,
            "",
        )];
        if let Some(text) = data {
            frames.push(Frame::debug(
                HwAddr::BROADCAST,
                entry.hw_addr,
                FrameType::DataDebug,
                text,
            ));
        }
        for frame in frames {
            socket
                .send_frame(entry.if_index, HwAddr::BROADCAST, &frame.serialize())
                .await?;
        }
        tracing::info!(name = %entry.name, if_index = %entry.if_index, "probe sent");
    }
    Ok(())
}
