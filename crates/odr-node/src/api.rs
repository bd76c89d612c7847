//! Client side of the local IPC channel.
//!
//! Applications talk to the daemon through Unix datagram sockets. Each
//! application binds its own endpoint (a well-known path for servers, a
//! random one for clients) and exchanges [`OdrDatagram`]s with the daemon's
//! socket. On send the datagram names the remote destination; on receive it
//! names the remote sender.

use std::path::{Path, PathBuf};
use std::time::Duration;

use odr_core::constants::DATAGRAM_LEN;
use odr_core::datagram::OdrDatagram;
use odr_core::types::{NodeAddr, Port};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::net::UnixDatagram;
use tracing::{debug, trace};

use crate::error::ApiError;

const EPHEMERAL_SUFFIX_LEN: usize = 6;
const EPHEMERAL_BIND_ATTEMPTS: usize = 8;

/// Bind a datagram socket at `path`, replacing a stale socket file left by a
/// previous run.
pub fn bind_datagram(path: &Path) -> std::io::Result<UnixDatagram> {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale socket"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    UnixDatagram::bind(path)
}

/// An application's endpoint on the local IPC channel.
///
/// The socket file is removed when the endpoint is dropped.
pub struct OdrEndpoint {
    socket: UnixDatagram,
    path: PathBuf,
}

impl OdrEndpoint {
    /// Bind at a fixed path.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref().to_path_buf();
        let socket = bind_datagram(&path)?;
        debug!(path = %path.display(), "endpoint bound");
        Ok(Self { socket, path })
    }

    /// Bind at `prefix` followed by a random suffix.
    pub fn bind_ephemeral(prefix: &str) -> Result<Self, ApiError> {
        let mut last_err = None;
        for _ in 0..EPHEMERAL_BIND_ATTEMPTS {
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(EPHEMERAL_SUFFIX_LEN)
                .map(char::from)
                .collect();
            let path = PathBuf::from(format!("{prefix}{suffix}"));
            if path.exists() {
                continue;
            }
            match UnixDatagram::bind(&path) {
                Ok(socket) => {
                    debug!(path = %path.display(), "ephemeral endpoint bound");
                    return Ok(Self { socket, path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => last_err = Some(e),
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_err
            .unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::AddrInUse))
            .into())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ask the daemon at `odr_path` to deliver `data` to `dst:port`.
    ///
    /// `forced` discards any cached route to `dst` and rediscovers it.
    /// Returns the number of bytes handed to the daemon.
    pub async fn msg_send(
        &self,
        odr_path: impl AsRef<Path>,
        dst: NodeAddr,
        port: Port,
        data: &[u8],
        forced: bool,
    ) -> Result<usize, ApiError> {
        let datagram = OdrDatagram::new(dst, port, forced, data)?;
        let sent = self
            .socket
            .send_to(&datagram.encode(), odr_path.as_ref())
            .await?;
        trace!(%dst, port, forced, bytes = sent, "message handed to daemon");
        Ok(sent)
    }

    /// Wait for the next message. Returns the payload and the remote
    /// sender's address and port.
    ///
    /// With `timeout` set, gives up with [`ApiError::Timeout`] once it
    /// elapses.
    pub async fn msg_recv(
        &self,
        timeout: Option<Duration>,
    ) -> Result<(Vec<u8>, NodeAddr, Port), ApiError> {
        let mut buf = [0u8; DATAGRAM_LEN];
        let len = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.socket.recv(&mut buf))
                .await
                .map_err(|_| ApiError::Timeout)??,
            None => self.socket.recv(&mut buf).await?,
        };
        let datagram = OdrDatagram::decode(&buf[..len])?;
        let (addr, port) = (datagram.addr, datagram.port);
        Ok((datagram.into_data(), addr, port))
    }
}

impl Drop for OdrEndpoint {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
