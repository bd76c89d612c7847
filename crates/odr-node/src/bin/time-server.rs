//! Time service: answers every request with the local time and hostname.

use std::path::PathBuf;

use clap::Parser;

use odr_core::constants::APP_DATA_CAPACITY;
use odr_node::clock::{hostname, local_time_string};
use odr_node::{HostTable, NodeConfig, OdrEndpoint};

#[derive(Parser)]
#[command(name = "time-server", about = "ODR time service")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
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
    let endpoint = match OdrEndpoint::bind(&config.ipc.time_server_path) {
        Ok(ep) => ep,
        Err(e) => {
            tracing::error!("failed to bind {}: {e}", config.ipc.time_server_path);
            std::process::exit(1);
        }
    };
    let me = hostname();
    tracing::info!(path = %endpoint.path().display(), host = %me, "time server listening");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received SIGINT, shutting down");
                break;
            }
            result = endpoint.msg_recv(None) => {
                let (_, src, src_port) = match result {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::warn!("receive failed: {e}");
                        continue;
                    }
                };
                let mut reply = format!("{} {me}", local_time_string());
                reply.truncate(APP_DATA_CAPACITY);
                println!("server at node {me} responding to request from {}", hosts.name_of(src));
                if let Err(e) = endpoint
                    .msg_send(&config.ipc.odr_path, src, src_port, reply.as_bytes(), false)
                    .await
                {
                    tracing::warn!(%src, src_port, "reply failed: {e}");
                }
            }
        }
    }
}
