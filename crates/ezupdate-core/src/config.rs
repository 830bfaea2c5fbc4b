//! Configuration types for the update engine
//!
//! [`UpdateConfig`] is assembled by the daemon (CLI flags, config file) and
//! handed to the core fully resolved. Optional provider fields are plain
//! strings that stay empty when unset, since drivers write them into request
//! bodies unconditionally.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::registry::ServiceDescriptor;

/// Per-I/O timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Time between address polls in daemon mode
pub const DEFAULT_UPDATE_PERIOD: Duration = Duration::from_secs(600);

/// Time between polls while the interface cannot be resolved
pub const DEFAULT_RESOLVE_PERIOD: Duration = Duration::from_secs(60);

/// Interface watched when none is configured
pub const DEFAULT_INTERFACE: &str = "eth0";

/// Username/password pair plus the Basic-auth token derived from them
///
/// The token is computed once, when the credentials are built, and reused by
/// every request of the run.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    username: String,
    password: String,
    basic_token: String,
}

impl Credentials {
    /// Build credentials and encode the Basic-auth token
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let password = password.into();
        let basic_token = STANDARD.encode(format!("{}:{}", username, password));

        Self {
            username,
            password,
            basic_token,
        }
    }

    /// Parse a `name[:password]` string
    ///
    /// Only the first `:` separates the two halves, so passwords may contain
    /// colons.
    pub fn parse(user: &str) -> Self {
        match user.split_once(':') {
            Some((name, password)) => Self::new(name, password),
            None => Self::new(user, ""),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Base64 of `username:password`, without the `Basic ` prefix
    pub fn basic_token(&self) -> &str {
        &self.basic_token
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

// Never print the password or the token
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("basic_token", &"<REDACTED>")
            .finish()
    }
}

/// Fully resolved configuration for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Provider host name
    pub server: String,

    /// Provider port, numeric or a service name such as `http`
    pub port: String,

    /// Request path (HTTP dialects) or operation (line dialect)
    pub request: String,

    /// Account credentials
    pub credentials: Credentials,

    /// Host name(s) to update at the provider
    pub host: String,

    /// Address to publish; empty means "resolve from the interface"
    pub address: String,

    /// Ask the provider to add a wildcard record
    pub wildcard: bool,

    /// Mail exchanger
    pub mx: String,

    /// Redirect / offline URL
    pub url: String,

    /// Cloak title (DHS only); empty disables cloaking
    pub cloak_title: String,

    /// Interface whose address is published
    pub interface: String,

    /// Bound on every connect, send and receive
    pub timeout: Duration,

    /// Attempts per one-shot run (at least one)
    pub retries: usize,

    /// Sleep between polls in daemon mode
    pub update_period: Duration,

    /// Sleep between polls while the interface is unresolvable
    pub resolve_period: Duration,

    /// Force an update after this much time without one; zero disables
    pub max_interval: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: String::new(),
            request: String::new(),
            credentials: Credentials::default(),
            host: String::new(),
            address: String::new(),
            wildcard: false,
            mx: String::new(),
            url: String::new(),
            cloak_title: String::new(),
            interface: DEFAULT_INTERFACE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retries: 1,
            update_period: DEFAULT_UPDATE_PERIOD,
            resolve_period: DEFAULT_RESOLVE_PERIOD,
            max_interval: Duration::ZERO,
        }
    }
}

impl UpdateConfig {
    /// Create a configuration pointing at a service's defaults
    pub fn for_service(service: &ServiceDescriptor) -> Self {
        let mut config = Self::default();
        config.apply_service_defaults(service);
        config
    }

    /// Fill server, port and request from the service where they are unset
    pub fn apply_service_defaults(&mut self, service: &ServiceDescriptor) {
        if self.server.is_empty() {
            self.server = service.default_server.to_string();
        }
        if self.port.is_empty() {
            self.port = service.default_port.to_string();
        }
        if self.request.is_empty() {
            self.request = service.default_request.to_string();
        }
    }

    /// Set the credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the host name to update
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server and port
    pub fn with_server(mut self, server: impl Into<String>, port: impl Into<String>) -> Self {
        self.server = server.into();
        self.port = port.into();
        self
    }

    /// Set the per-I/O timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Copy of this configuration publishing `address`
    pub fn with_address(&self, address: Ipv4Addr) -> Self {
        let mut config = self.clone();
        config.address = address.to_string();
        config
    }

    /// Validate the fields every driver relies on
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server.is_empty() {
            return Err(crate::Error::config("server cannot be empty"));
        }
        if self.port.is_empty() {
            return Err(crate::Error::config("port cannot be empty"));
        }
        if !self.credentials.is_complete() {
            return Err(crate::Error::config(
                "user name and password are both required",
            ));
        }
        if self.timeout.is_zero() {
            return Err(crate::Error::config("timeout must be > 0"));
        }
        if self.retries == 0 {
            return Err(crate::Error::config("retries must be at least 1"));
        }
        if self.interface.is_empty() {
            return Err(crate::Error::config("interface cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_token_matches_rfc7617_example() {
        let credentials = Credentials::new("Aladdin", "open sesame");
        assert_eq!(credentials.basic_token(), "QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn parse_splits_on_first_colon() {
        let credentials = Credentials::parse("bob:pa:ss");
        assert_eq!(credentials.username(), "bob");
        assert_eq!(credentials.password(), "pa:ss");

        let bare = Credentials::parse("bob");
        assert_eq!(bare.username(), "bob");
        assert_eq!(bare.password(), "");
        assert!(!bare.is_complete());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = UpdateConfig::default().with_credentials(Credentials::new("bob", "hunter2"));
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("bob"));
        assert!(!debug_str.contains("hunter2"));
        assert!(!debug_str.contains(config.credentials.basic_token()));
    }

    #[test]
    fn validate_requires_server_and_credentials() {
        let config = UpdateConfig::default();
        assert!(config.validate().is_err());

        let config = config.with_server("example.net", "80");
        assert!(config.validate().is_err());

        let config = config.with_credentials(Credentials::new("bob", "secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_retries_and_timeout() {
        let base = UpdateConfig::default()
            .with_server("example.net", "80")
            .with_credentials(Credentials::new("bob", "secret"));

        let mut config = base.clone();
        config.retries = 0;
        assert!(config.validate().is_err());

        let config = base.with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let config = UpdateConfig::default();
        assert_eq!(config.mx, "");
        assert_eq!(config.url, "");
        assert_eq!(config.cloak_title, "");
        assert_eq!(config.address, "");
        assert_eq!(config.interface, DEFAULT_INTERFACE);
        assert!(config.max_interval.is_zero());
    }

    #[test]
    fn with_address_only_changes_address() {
        let config = UpdateConfig::default().with_host("a.example.com");
        let fresh = config.with_address(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(fresh.address, "10.0.0.1");
        assert_eq!(fresh.host, "a.example.com");
        assert_eq!(config.address, "");
    }
}
