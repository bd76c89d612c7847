//! Core Node struct and async event loop.
//!
//! The Node owns the routing engine, the frame transport and the daemon's
//! IPC socket. Receive bridges for both channels feed a single event loop,
//! which is the only place router state is touched: each event runs to
//! completion, including any queue drain, before the next is taken.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixDatagram;
use tokio::sync::{mpsc, watch};

use odr_core::constants::DATAGRAM_LEN;
use odr_core::datagram::OdrDatagram;
use odr_interfaces::{FrameTransport, ReceivedFrame};
use odr_transport::interfaces::InterfaceTable;
use odr_transport::router::{OdrRouter, RouterAction, RouterConfig};

use crate::api::bind_datagram;
use crate::clock::unix_now;
use crate::error::NodeError;

/// Events delivered to the central event loop from the receive bridges.
#[derive(Debug)]
enum NodeEvent {
    Frame(ReceivedFrame),
    Local { path: PathBuf, raw: Vec<u8> },
    TransportDown,
}

/// Cloneable handle that stops a running [`Node`].
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// An ODR daemon over transport `T`.
pub struct Node<T: FrameTransport + 'static> {
    router: OdrRouter,
    transport: Arc<T>,
    ipc: Arc<UnixDatagram>,
    ipc_path: PathBuf,
    maintenance_interval: Duration,
    event_tx: mpsc::Sender<NodeEvent>,
    event_rx: mpsc::Receiver<NodeEvent>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    bridge_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl<T: FrameTransport + 'static> Node<T> {
    /// Create a node and bind its IPC socket at `ipc_path`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: RouterConfig,
        interfaces: InterfaceTable,
        transport: T,
        ipc_path: &Path,
        maintenance_interval: Duration,
    ) -> Result<Self, NodeError> {
        if interfaces.is_empty() {
            return Err(NodeError::NoInterfaces);
        }
        let ipc = bind_datagram(ipc_path)?;
        tracing::info!(
            local_addr = %config.local_addr,
            staleness = config.staleness,
            interfaces = interfaces.len(),
            ipc = %ipc_path.display(),
            "node created"
        );
        for entry in interfaces.iter() {
            tracing::info!(
                name = %entry.name,
                hw_addr = %entry.hw_addr,
                if_index = %entry.if_index,
                "using interface"
            );
        }

        let (event_tx, event_rx) = mpsc::channel(1024);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            router: OdrRouter::new(config, interfaces),
            transport: Arc::new(transport),
            ipc: Arc::new(ipc),
            ipc_path: ipc_path.to_path_buf(),
            maintenance_interval,
            event_tx,
            event_rx,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            bridge_handles: Vec::new(),
        })
    }

    pub fn router(&self) -> &OdrRouter {
        &self.router
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// Spawn the frame and IPC receive bridges.
    pub fn start(&mut self) -> Result<(), NodeError> {
        if !self.bridge_handles.is_empty() {
            return Err(NodeError::AlreadyRunning);
        }
        self.spawn_frame_bridge();
        self.spawn_ipc_bridge();
        Ok(())
    }

    fn spawn_frame_bridge(&mut self) {
        let transport = Arc::clone(&self.transport);
        let event_tx = self.event_tx.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("frame bridge shutting down");
                        break;
                    }
                    result = transport.recv_frame() => {
                        match result {
                            Ok(frame) => {
                                if event_tx.send(NodeEvent::Frame(frame)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("frame receive error: {e}");
                                let _ = event_tx.send(NodeEvent::TransportDown).await;
                                break;
                            }
                        }
                    }
                }
            }
        });
        self.bridge_handles.push(handle);
    }

    fn spawn_ipc_bridge(&mut self) {
        let ipc = Arc::clone(&self.ipc);
        let event_tx = self.event_tx.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        let handle = tokio::spawn(async move {
            let mut buf = [0u8; DATAGRAM_LEN * 2];
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("ipc bridge shutting down");
                        break;
                    }
                    result = ipc.recv_from(&mut buf) => {
                        match result {
                            Ok((len, from)) => {
                                let Some(path) = from.as_pathname() else {
                                    tracing::warn!("ignoring request from unnamed socket");
                                    continue;
                                };
                                let event = NodeEvent::Local {
                                    path: path.to_path_buf(),
                                    raw: buf[..len].to_vec(),
                                };
                                if event_tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::warn!("ipc receive error: {e}"),
                        }
                    }
                }
            }
        });
        self.bridge_handles.push(handle);
    }

    /// Run the main event loop. Returns when shutdown is signalled or the
    /// frame transport fails.
    pub async fn run(&mut self) {
        let mut maintenance = tokio::time::interval(self.maintenance_interval);
        // Don't fire immediately
        maintenance.tick().await;

        tracing::info!("entering event loop");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    tracing::info!("shutdown signal received");
                    break;
                }

                event = self.event_rx.recv() => {
                    let now = unix_now();
                    self.router.purge(now);
                    match event {
                        Some(NodeEvent::Frame(frame)) => self.handle_frame(frame, now).await,
                        Some(NodeEvent::Local { path, raw }) => {
                            self.handle_local(&path, &raw, now).await;
                        }
                        Some(NodeEvent::TransportDown) => {
                            tracing::error!("frame transport down, exiting");
                            break;
                        }
                        None => {
                            tracing::info!("event channel closed, exiting");
                            break;
                        }
                    }
                }

                _ = maintenance.tick() => {
                    self.run_maintenance().await;
                }
            }
        }
    }

    /// Signal the node to shut down.
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop the bridges and remove the IPC socket file.
    pub async fn shutdown(mut self) {
        tracing::info!("shutting down node");
        self.trigger_shutdown();

        for handle in self.bridge_handles.drain(..) {
            let _ = handle.await;
        }
        if let Err(e) = std::fs::remove_file(&self.ipc_path) {
            tracing::debug!(path = %self.ipc_path.display(), "could not remove ipc socket: {e}");
        }

        tracing::info!("node shutdown complete");
    }

    async fn handle_frame(&mut self, frame: ReceivedFrame, now: u64) {
        match self
            .router
            .handle_frame(&frame.data, frame.sender, frame.if_index, now)
        {
            Ok(actions) => self.execute(actions).await,
            Err(e) => tracing::debug!(
                sender = %frame.sender,
                if_index = %frame.if_index,
                "dropping frame: {e}"
            ),
        }
    }

    async fn handle_local(&mut self, path: &Path, raw: &[u8], now: u64) {
        let request = match OdrDatagram::decode(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(path = %path.display(), "malformed local request: {e}");
                return;
            }
        };
        let path = path.to_string_lossy();
        match self.router.handle_local_request(&path, &request, now) {
            Ok(actions) => self.execute(actions).await,
            Err(e) => tracing::warn!(%path, "local request rejected: {e}"),
        }
    }

    async fn run_maintenance(&mut self) {
        let now = unix_now();
        self.router.purge(now);
        let actions = self.router.drain_queue(now);
        self.execute(actions).await;
    }

    async fn execute(&self, actions: Vec<RouterAction>) {
        for action in actions {
            match action {
                RouterAction::Transmit {
                    if_index,
                    dest,
                    frame,
                } => {
                    if let Err(e) = self.transport.send_frame(if_index, dest, &frame).await {
                        tracing::warn!(%if_index, %dest, "frame send failed: {e}");
                    }
                }
                RouterAction::DeliverLocal { path, datagram } => {
                    match self.ipc.send_to(&datagram.encode(), &path).await {
                        Ok(_) => tracing::info!(
                            %path,
                            src = %datagram.addr,
                            src_port = datagram.port,
                            "message delivered"
                        ),
                        Err(e) => tracing::warn!(%path, "local delivery failed: {e}"),
                    }
                }
            }
        }
    }
}
