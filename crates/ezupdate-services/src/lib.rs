// # ezupdate Provider Dialects
//
// This crate implements the update dialects of the supported dynamic DNS
// providers and the static table that maps service names onto them.
//
// ## Dialects
//
// - **EZIP** (`ezip`): one HTTP GET, the server may detect the address itself
// - **DynDNS** (`dyndns`, `dyndns-static`): one HTTP GET, success needs a body token
// - **PenguinPowered** (`pgpow`): line-oriented session on its own port
// - **DHS** (`dhs`): HTTP POST, plus a paced second POST for the mail exchanger
//
// ## Driver Constraints
//
// - ✅ Build requests from the `UpdateConfig` they are handed
// - ✅ Classify replies into success, auth failure, protocol or network error
// - ❌ NO retry logic (owned by the `Dispatcher`)
// - ❌ NO change detection or scheduling (owned by the `DaemonScheduler`)
// - ❌ NO state kept between calls
//
// ## Security
//
// Passwords and Basic-auth tokens never appear in logs. Request lines are
// logged, header blocks are not.

pub mod dhs;
pub mod dyndns;
pub mod ezip;
pub mod http;
pub mod pgpow;
pub mod registry;

pub use dhs::DhsDriver;
pub use dyndns::DynDnsDriver;
pub use ezip::EzipDriver;
pub use pgpow::PgpowDriver;
pub use registry::{DEFAULT_SERVICE, SERVICES, registry};

/// Client name announced to providers
pub const CLIENT_NAME: &str = "ez-update";

/// Client version announced to providers
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `ez-update-{version} {os} (by Angus Mackay)`
///
/// The credit suffix is part of what providers expect to see.
pub fn user_agent() -> String {
    format!(
        "{}-{} {} (by Angus Mackay)",
        CLIENT_NAME,
        CLIENT_VERSION,
        std::env::consts::OS
    )
}
