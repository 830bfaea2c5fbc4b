// # Interface Address Resolver
//
// Looks up the IPv4 address bound to a network interface with getifaddrs(3).
//
// ## Behavior
//
// - ✅ One query per call, repeated once only when it found no IPv4 address
// - ✅ Distinguishes "no such interface" from "no IPv4 address"
// - ❌ NO caching (the scheduler decides when to ask again)
// - ❌ NO change notifications (the scheduler polls)
//
// ## Platform Support
//
// Unix only. On other targets every lookup fails with an interface
// resolution error.

use async_trait::async_trait;
use ezupdate_core::{AddressResolver, Error, Result};
use std::net::Ipv4Addr;

/// What one query found for an interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceAddresses {
    /// The interface exists
    pub found: bool,
    /// Its IPv4 addresses, in the order the OS reported them
    pub v4: Vec<Ipv4Addr>,
}

/// Query the OS for `interface`'s IPv4 addresses
pub fn interface_addresses(interface: &str) -> std::io::Result<InterfaceAddresses> {
    os::interface_addresses(interface)
}

/// getifaddrs-backed [`AddressResolver`]
#[derive(Debug, Default, Clone, Copy)]
pub struct InterfaceResolver;

impl InterfaceResolver {
    pub fn new() -> Self {
        Self
    }

    fn query(interface: &str) -> Result<InterfaceAddresses> {
        interface_addresses(interface)
            .map_err(|e| Error::interface(format!("{}: {}", interface, e)))
    }
}

#[async_trait]
impl AddressResolver for InterfaceResolver {
    async fn resolve(&self, interface: &str) -> Result<Ipv4Addr> {
        let mut lookup = Self::query(interface)?;

        if lookup.v4.is_empty() {
            tracing::debug!(interface, "no IPv4 address on first query, asking again");
            lookup = Self::query(interface)?;
        }

        match lookup.v4.first() {
            Some(address) => {
                tracing::trace!(interface, %address, "interface address");
                Ok(*address)
            }
            None if !lookup.found => Err(Error::interface(format!(
                "{}: no such interface",
                interface
            ))),
            None => Err(Error::interface(format!(
                "{}: no IPv4 address assigned",
                interface
            ))),
        }
    }
}

#[cfg(unix)]
mod os {
    use std::ffi::CStr;
    use std::net::Ipv4Addr;

    use super::InterfaceAddresses;

    pub(super) fn interface_addresses(interface: &str) -> std::io::Result<InterfaceAddresses> {
        let mut result = InterfaceAddresses::default();
        let mut head: *mut libc::ifaddrs = std::ptr::null_mut();

        // SAFETY: on success getifaddrs stores a list head we free below.
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(std::io::Error::last_os_error());
        }

        let mut current = head as *const libc::ifaddrs;
        while !current.is_null() {
            // SAFETY: nullness is checked above and the list is alive until freeifaddrs.
            let entry = unsafe { &*current };
            current = entry.ifa_next as *const _;

            if entry.ifa_name.is_null() {
                continue;
            }

            // SAFETY: the OS hands out NUL-terminated interface names.
            let name = unsafe { CStr::from_ptr(entry.ifa_name) };
            if name.to_bytes() != interface.as_bytes() {
                continue;
            }
            result.found = true;

            if entry.ifa_addr.is_null() {
                continue;
            }

            // SAFETY: nullness is checked above.
            let family = unsafe { (*entry.ifa_addr).sa_family };
            if i32::from(family) != libc::AF_INET {
                continue;
            }

            // SAFETY: the pointee type is given by sa_family.
            let addr = unsafe { *(entry.ifa_addr as *const libc::sockaddr_in) };
            result.v4.push(Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr)));
        }

        // SAFETY: head came from a successful getifaddrs call.
        unsafe { libc::freeifaddrs(head) };

        Ok(result)
    }
}

#[cfg(not(unix))]
mod os {
    use super::InterfaceAddresses;

    pub(super) fn interface_addresses(_interface: &str) -> std::io::Result<InterfaceAddresses> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "interface lookup is not supported on this platform",
        ))
    }
}
