// # Transport Traits
//
// Defines the timed byte-stream interface drivers talk through.
//
// ## Implementations
//
// - TCP with tokio: `crate::transport::TcpTransport`
// - Scripted connections in tests: `crate::transport::TimedConnection` over a mock stream

use async_trait::async_trait;
use std::time::Duration;

use crate::error::TransportError;

/// Opens connections to a provider
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to `host:port`, bounding the connect and every later I/O by `timeout`
    ///
    /// `port` may be numeric or a service name.
    async fn connect(
        &self,
        host: &str,
        port: &str,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, TransportError>;
}

/// One open, timed connection
///
/// Dropping the connection closes it.
#[async_trait]
pub trait Connection: Send {
    /// Write all of `bytes`
    ///
    /// Fails with [`TransportError::Timeout`] if the peer does not accept the
    /// data in time. A partial write is not resumed.
    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read at most `max_bytes`
    ///
    /// An empty vector means the peer closed the connection cleanly.
    async fn recv(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError>;

    /// Printable peer description for logs
    fn peer(&self) -> &str;
}
