//! Timed TCP transport
//!
//! Every connect, send and receive is bounded by the configured timeout using
//! tokio's readiness-based I/O, and a timeout surfaces as
//! [`TransportError::Timeout`] rather than a generic I/O error so drivers can
//! tell "slow peer" from "broken peer". Partial transfers are never resumed;
//! the dispatcher retries the whole exchange instead.
//!
//! [`ConnectionState`] owns one connection for the length of one update
//! attempt and accumulates the reply. Dropping it closes the socket, which
//! covers every exit path of a driver.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::config::UpdateConfig;
use crate::error::{Result, TransportError};
use crate::traits::{Connection, Transport};

/// Upper bound on an accumulated reply
pub const RESPONSE_BUFFER_SIZE: usize = 4 * 1024 - 1;

/// Transport opening plain TCP connections
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl TcpTransport {
    /// Create a new TCP transport
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(
        &self,
        host: &str,
        port: &str,
        limit: Duration,
    ) -> std::result::Result<Box<dyn Connection>, TransportError> {
        let port_number = resolve_port(port)?;

        let stream = match timeout(limit, connect_any(host, port_number)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportError::Timeout {
                    operation: "connect",
                    after: limit,
                });
            }
        };

        let peer = match stream.peer_addr() {
            Ok(addr) => format!("{} ({})", host, addr),
            Err(_) => host.to_string(),
        };

        Ok(Box::new(TimedConnection::new(stream, peer, limit)))
    }
}

/// Look `host` up, then try its addresses in order
async fn connect_any(host: &str, port: u16) -> std::result::Result<TcpStream, TransportError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| TransportError::Resolve(format!("host {:?}: {}", host, e)))?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                trace!(%addr, "connect failed: {}", e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => TransportError::Io(e),
        None => TransportError::Resolve(format!("host {:?}: no addresses", host)),
    })
}

/// Resolve a numeric port or a TCP service name
pub fn resolve_port(port: &str) -> std::result::Result<u16, TransportError> {
    if let Ok(number) = port.trim().parse::<u16>() {
        return Ok(number);
    }

    service_port(port.trim()).ok_or_else(|| TransportError::Resolve(format!("port {:?}", port)))
}

#[cfg(unix)]
fn service_port(name: &str) -> Option<u16> {
    let name = std::ffi::CString::new(name).ok()?;

    // SAFETY: both arguments are NUL-terminated. The returned entry points
    // into libc-owned static storage and is read before any other call can
    // overwrite it (the engine is single-threaded).
    let entry = unsafe { libc::getservbyname(name.as_ptr(), c"tcp".as_ptr()) };
    if entry.is_null() {
        return None;
    }

    // SAFETY: nullness is checked above.
    let raw = unsafe { (*entry).s_port };

    // s_port holds the port in network byte order
    Some(u16::from_be(raw as u16))
}

#[cfg(not(unix))]
fn service_port(_name: &str) -> Option<u16> {
    None
}

/// A byte stream whose every operation is bounded by a timeout
///
/// Generic over the stream so tests can drive drivers with scripted I/O.
pub struct TimedConnection<S> {
    stream: S,
    peer: String,
    timeout: Duration,
}

impl<S> TimedConnection<S> {
    /// Wrap `stream`, bounding each operation by `timeout`
    pub fn new(stream: S, peer: impl Into<String>, timeout: Duration) -> Self {
        Self {
            stream,
            peer: peer.into(),
            timeout,
        }
    }
}

#[async_trait]
impl<S> Connection for TimedConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, bytes: &[u8]) -> std::result::Result<(), TransportError> {
        let limit = self.timeout;
        let stream = &mut self.stream;

        let write = async move {
            stream.write_all(bytes).await?;
            stream.flush().await
        };

        match timeout(limit, write).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::Timeout {
                operation: "send",
                after: limit,
            }),
        }
    }

    async fn recv(&mut self, max_bytes: usize) -> std::result::Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_bytes];

        match timeout(self.timeout, self.stream.read(&mut buf)).await {
            Ok(Ok(n)) => {
                buf.truncate(n);
                Ok(buf)
            }
            Ok(Err(e)) => Err(TransportError::Io(e)),
            Err(_) => Err(TransportError::Timeout {
                operation: "recv",
                after: self.timeout,
            }),
        }
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

/// One update attempt's connection and reply buffer
pub struct ConnectionState {
    conn: Box<dyn Connection>,
    response: Vec<u8>,
    capacity: usize,
}

impl ConnectionState {
    /// Connect to the configured server
    pub async fn open(transport: &dyn Transport, config: &UpdateConfig) -> Result<Self> {
        debug!(server = %config.server, port = %config.port, "connecting");

        let conn = transport
            .connect(&config.server, &config.port, config.timeout)
            .await
            .inspect_err(|e| {
                warn!(server = %config.server, port = %config.port, "error connecting: {}", e)
            })?;

        debug!(peer = conn.peer(), "connected");
        Ok(Self::new(conn))
    }

    /// Wrap an already open connection
    pub fn new(conn: Box<dyn Connection>) -> Self {
        Self {
            conn,
            response: Vec::with_capacity(RESPONSE_BUFFER_SIZE),
            capacity: RESPONSE_BUFFER_SIZE,
        }
    }

    /// Send raw bytes
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.conn.send(bytes).await?;
        Ok(())
    }

    /// Read until the peer closes or the buffer fills
    ///
    /// A timeout after part of the reply arrived ends the read and leaves the
    /// partial reply for parsing. A timeout before any byte arrived is an error.
    pub async fn read_to_close(&mut self) -> Result<&[u8]> {
        self.response.clear();

        while self.response.len() < self.capacity {
            let room = self.capacity - self.response.len();

            match self.conn.recv(room).await {
                Ok(chunk) if chunk.is_empty() => break,
                Ok(chunk) => {
                    trace!(bytes = chunk.len(), total = self.response.len() + chunk.len(), "received");
                    self.response.extend_from_slice(&chunk);
                }
                Err(e) if e.is_timeout() && !self.response.is_empty() => {
                    debug!(peer = self.conn.peer(), "{}, using partial reply", e);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(&self.response)
    }

    /// Read one status line, without its line terminator
    pub async fn read_reply_line(&mut self) -> Result<String> {
        self.response.clear();

        while !self.response.contains(&b'\n') && self.response.len() < self.capacity {
            let room = self.capacity - self.response.len();
            let chunk = self.conn.recv(room).await?;

            if chunk.is_empty() {
                if self.response.is_empty() {
                    return Err(TransportError::Closed.into());
                }
                break;
            }

            self.response.extend_from_slice(&chunk);
        }

        let text = String::from_utf8_lossy(&self.response);
        let line = text.lines().next().unwrap_or_default().to_string();
        trace!(peer = self.conn.peer(), reply = %line, "server says");

        Ok(line)
    }

    /// The last reply read
    pub fn response(&self) -> &[u8] {
        &self.response
    }

    /// Peer description for logs
    pub fn peer(&self) -> &str {
        self.conn.peer()
    }
}
