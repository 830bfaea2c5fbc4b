//! DynDNS dialect
//!
//! Shared by the dynamic and static DynDNS services, which differ only in
//! their request path. A `200` alone is not enough: the body has to carry
//! [`SUCCESS_TOKEN`].

use async_trait::async_trait;
use ezupdate_core::{Error, ProtocolDriver, RequestBuilder, Result, Transport, UpdateConfig};

use crate::http;

/// Body marker of an accepted update
pub const SUCCESS_TOKEN: &[u8] = b"NOERROR\n";

/// Driver for DynDNS style providers
#[derive(Debug, Default, Clone, Copy)]
pub struct DynDnsDriver;

impl DynDnsDriver {
    /// Build the complete request, headers included
    pub fn build_request(config: &UpdateConfig) -> Result<String> {
        let mut request = RequestBuilder::default();

        request
            .raw(&format!(
                "GET {}?action=edit&started=1&hostname=YES&",
                config.request
            ))?
            .param("myip", &config.address)?
            .param("wildcard", if config.wildcard { "ON" } else { "OFF" })?
            .param("mx", &config.mx)?
            .param("backmx", "NO")?
            .param("host_id", &config.host)?
            .line(" HTTP/1.0")?;
        http::write_headers(&mut request, config)?;
        request.line("")?;

        Ok(request.finish())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[async_trait]
impl ProtocolDriver for DynDnsDriver {
    fn check_preconditions(&self, config: &UpdateConfig) -> Result<()> {
        config.validate()?;
        if config.host.is_empty() {
            return Err(Error::config("host is required"));
        }
        Ok(())
    }

    async fn update(&self, config: &UpdateConfig, transport: &dyn Transport) -> Result<()> {
        let request = Self::build_request(config)?;
        let reply = http::exchange(transport, config, &request).await?;

        let status = http::check_status(&reply)?;
        if !contains(&reply, SUCCESS_TOKEN) {
            let output = String::from_utf8_lossy(&reply);
            tracing::warn!(host = %config.host, "error processing request, server output: {}", output);
            return Err(Error::protocol(
                Some(status.code),
                "error processing request: reply does not confirm the update",
            ));
        }

        tracing::debug!(host = %config.host, "request successful");
        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "dyndns"
    }
}
