//! Core traits for the update engine
//!
//! This module defines the seams between the engine and its collaborators.
//!
//! - [`ProtocolDriver`]: Speak one provider's update dialect
//! - [`AddressResolver`]: Look up an interface's IPv4 address
//! - [`Transport`] / [`Connection`]: Timed byte streams to a provider

pub mod driver;
pub mod resolver;
pub mod transport;

pub use driver::ProtocolDriver;
pub use resolver::AddressResolver;
pub use transport::{Connection, Transport};
