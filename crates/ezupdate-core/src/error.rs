//! Error types for the update engine
//!
//! Every failure the core can produce maps onto one [`ErrorKind`], which is
//! what the dispatcher, the scheduler and the daemon's exit code care about.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for update operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Fatal, detected before any network activity
    Config,
    /// Connect, timeout or I/O failure; worth retrying
    Network,
    /// Unexpected status code or malformed response
    Protocol,
    /// The provider rejected the credentials
    Auth,
    /// The watched interface has no usable IPv4 address
    InterfaceResolution,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::Network => "network",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Auth => "auth",
            ErrorKind::InterfaceResolution => "interface",
        };
        f.write_str(name)
    }
}

/// Failures of the timed transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// The operation did not complete within the configured timeout
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Which operation timed out ("connect", "send", "recv")
        operation: &'static str,
        /// The timeout that elapsed
        after: Duration,
    },

    /// Socket-level I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Host or port could not be resolved
    #[error("unable to resolve {0}")]
    Resolve(String),

    /// The peer closed the connection before sending a reply
    #[error("connection closed by peer")]
    Closed,
}

impl TransportError {
    /// Whether this is a timeout rather than a hard failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// Core error type for the update engine
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A request field would not fit in the request buffer
    #[error("Request too large: field `{field}` exceeds the {capacity}-byte request buffer")]
    RequestTooLarge {
        /// Name of the field that overflowed
        field: String,
        /// Capacity of the request buffer
        capacity: usize,
    },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// Unexpected or malformed provider response
    #[error("Protocol error: {message}")]
    Protocol {
        /// Numeric status, when one could be identified
        status: Option<u16>,
        /// Captured server text or a description of the problem
        message: String,
    },

    /// Authentication rejected by the provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Interface address lookup failed
    #[error("Interface resolution failed: {0}")]
    InterfaceResolution(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a protocol error with an optional status code
    pub fn protocol(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an interface resolution error
    pub fn interface(msg: impl Into<String>) -> Self {
        Self::InterfaceResolution(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) | Error::RequestTooLarge { .. } => ErrorKind::Config,
            Error::Network(_) => ErrorKind::Network,
            Error::Protocol { .. } => ErrorKind::Protocol,
            Error::Authentication(_) => ErrorKind::Auth,
            Error::InterfaceResolution(_) => ErrorKind::InterfaceResolution,
        }
    }

    /// Status code carried by a protocol error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol { status, .. } => *status,
            Error::Authentication(_) => Some(401),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Network(TransportError::Io(err))
    }
}
