// # Protocol Driver Trait
//
// Defines the interface every provider dialect implements.
//
// ## Implementations
//
// - EZIP, DynDNS, PenguinPowered, DHS: `ezupdate-services` crate
//
// ## Usage
//
// ```rust,ignore
// use ezupdate_core::{ProtocolDriver, TcpTransport};
//
// let transport = TcpTransport::new();
// driver.check_preconditions(&config)?;
// driver.update(&config, &transport).await?;
// ```

use async_trait::async_trait;

use crate::config::UpdateConfig;
use crate::traits::Transport;

/// Trait for provider dialect implementations
///
/// A driver is stateless: all it knows comes from the [`UpdateConfig`] it is
/// handed, and every connection it opens is dropped before `update` returns.
///
/// # Responsibilities
///
/// - ✅ Build the request for its dialect and drive the exchange
/// - ✅ Classify the reply as success, auth failure, protocol error or
///   network failure
/// - ❌ Retry or pause between attempts (owned by the `Dispatcher`)
/// - ❌ Decide whether an update is needed (owned by the `DaemonScheduler`)
/// - ❌ Prompt for missing input; missing fields are a configuration error
#[async_trait]
pub trait ProtocolDriver: Send + Sync {
    /// Check that the configuration carries everything this dialect needs
    ///
    /// Runs once before any attempt. The default accepts any configuration
    /// that passes [`UpdateConfig::validate`].
    fn check_preconditions(&self, config: &UpdateConfig) -> Result<(), crate::Error> {
        config.validate()
    }

    /// Perform one update exchange
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the provider accepted the update
    /// - `Err(Error::Authentication)`: credentials rejected
    /// - `Err(Error::Protocol)`: unexpected status or malformed reply
    /// - `Err(Error::Network)`: connect, timeout or I/O failure
    /// - `Err(Error::Config)`: the configuration cannot be expressed on the wire
    async fn update(
        &self,
        config: &UpdateConfig,
        transport: &dyn Transport,
    ) -> Result<(), crate::Error>;

    /// Whether the dialect needs a locally resolved address
    ///
    /// Dialects whose server detects the caller's address return `false`.
    fn requires_address(&self) -> bool {
        true
    }

    /// Short name for logging
    fn driver_name(&self) -> &'static str;
}
