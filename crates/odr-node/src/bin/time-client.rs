//! Interactive time client: asks a remote time server for its clock.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use odr_core::types::NodeAddr;
use odr_node::clock::hostname;
use odr_node::config::IpcSection;
use odr_node::{ApiError, HostTable, NodeConfig, OdrEndpoint};

const REQUEST: &[u8] = b"TIME";

#[derive(Parser)]
#[command(name = "time-client", about = "ODR time client")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds to wait for each reply
    #[arg(short, long, default_value_t = 5)]
    timeout: u64,
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

    let hosts = match HostTable::from_config(&config.hosts) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };
    let endpoint = match OdrEndpoint::bind_ephemeral(&config.ipc.client_path_prefix) {
        Ok(ep) => ep,
        Err(e) => {
            tracing::error!("failed to bind client endpoint: {e}");
            std::process::exit(1);
        }
    };
    let me = hostname();
    let timeout = Duration::from_secs(cli.timeout);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let _ = stdout
            .write_all(b"server node name (or 'exit'): ")
            .await;
        let _ = stdout.flush().await;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("stdin: {e}");
                break;
            }
        };
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        if name == "exit" {
            break;
        }
        let Some(server) = hosts.resolve(name) else {
            println!("unknown node {name}");
            continue;
        };

        println!("client at node {me} sending request to server at {name}");
        match request_time(&endpoint, &config.ipc, server, timeout).await {
            Ok(reply) => println!(
                "client at node {me}: received from {name} <{}>",
                String::from_utf8_lossy(&reply)
            ),
            Err(e) => tracing::warn!(%server, "request failed: {e}"),
        }
    }
}

/// Send one request, retrying once with forced rediscovery on timeout.
async fn request_time(
    endpoint: &OdrEndpoint,
    ipc: &IpcSection,
    server: NodeAddr,
    timeout: Duration,
) -> Result<Vec<u8>, ApiError> {
    for forced in [false, true] {
        endpoint
            .msg_send(&ipc.odr_path, server, ipc.time_server_port, REQUEST, forced)
            .await?;
        match endpoint.msg_recv(Some(timeout)).await {
            Ok((data, _, _)) => return Ok(data),
            Err(ApiError::Timeout) if !forced => println!("timeout on response"),
            Err(ApiError::Timeout) => {
                println!("failed on communication");
                return Err(ApiError::Timeout);
            }
            Err(e) => return Err(e),
        }
    }
    Err(ApiError::Timeout)
}
