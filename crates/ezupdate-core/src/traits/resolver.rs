// # Address Resolver Trait
//
// Looks up the IPv4 address currently bound to a network interface.
//
// ## Implementations
//
// - `getifaddrs`-based (Unix): `ezupdate-iface` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for interface address lookups
///
/// A resolver is a pure query: it never caches, never retries on a schedule
/// and never sleeps. The scheduler decides when to ask again.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Get the IPv4 address bound to `interface`
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: the interface's address
    /// - `Err(Error::InterfaceResolution)`: unknown interface or no IPv4 address
    async fn resolve(&self, interface: &str) -> Result<Ipv4Addr, crate::Error>;
}
