//! Static service registry
//!
//! Every supported provider is described by one [`ServiceDescriptor`] in a
//! table fixed at compile time. The descriptor names the provider's defaults
//! and points at the `static` driver that speaks its dialect, so selecting a
//! service never allocates or constructs anything.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ezupdate_core::registry::ServiceRegistry;
//!
//! let registry = ServiceRegistry::new(&SERVICES);
//! let service = registry.get("justlinux")?;
//! let config = UpdateConfig::for_service(service);
//! ```

use crate::error::{Error, Result};
use crate::traits::ProtocolDriver;

/// Immutable description of one provider
pub struct ServiceDescriptor {
    /// Primary identifier, as accepted on the command line
    pub id: &'static str,

    /// Alternative identifiers
    pub aliases: &'static [&'static str],

    /// Human-readable name
    pub name: &'static str,

    /// Server used when none is configured
    pub default_server: &'static str,

    /// Port used when none is configured
    pub default_port: &'static str,

    /// Request path (or operation) used when none is configured
    pub default_request: &'static str,

    /// Driver speaking this provider's dialect
    pub driver: &'static dyn ProtocolDriver,
}

impl ServiceDescriptor {
    /// Whether `name` is this service's identifier or one of its aliases
    pub fn matches(&self, name: &str) -> bool {
        self.id == name || self.aliases.contains(&name)
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("id", &self.id)
            .field("aliases", &self.aliases)
            .field("name", &self.name)
            .field("default_server", &self.default_server)
            .field("default_port", &self.default_port)
            .field("default_request", &self.default_request)
            .field("driver", &self.driver.driver_name())
            .finish()
    }
}

/// Lookup over a static service table
#[derive(Debug, Clone, Copy)]
pub struct ServiceRegistry {
    services: &'static [ServiceDescriptor],
}

impl ServiceRegistry {
    /// Create a registry over `services`
    pub const fn new(services: &'static [ServiceDescriptor]) -> Self {
        Self { services }
    }

    /// Find a service by identifier or alias
    pub fn find(&self, name: &str) -> Option<&'static ServiceDescriptor> {
        self.services.iter().find(|service| service.matches(name))
    }

    /// Find a service, failing with a configuration error listing the choices
    pub fn get(&self, name: &str) -> Result<&'static ServiceDescriptor> {
        self.find(name).ok_or_else(|| {
            Error::config(format!(
                "unknown service type \"{}\" (available: {})",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// All services, in table order
    pub fn list(&self) -> &'static [ServiceDescriptor] {
        self.services
    }

    /// Every accepted identifier, aliases included
    pub fn names(&self) -> Vec<&'static str> {
        self.services
            .iter()
            .flat_map(|service| std::iter::once(service.id).chain(service.aliases.iter().copied()))
            .collect()
    }
}
