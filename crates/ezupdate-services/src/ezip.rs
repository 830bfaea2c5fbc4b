//! EZ-IP dialect
//!
//! A single `GET` carrying every field as a query parameter. An empty
//! address is sent as-is and the server uses the connection's source address.

use async_trait::async_trait;
use ezupdate_core::{Error, ProtocolDriver, RequestBuilder, Result, Transport, UpdateConfig};

use crate::http;

/// Driver for EZ-IP style providers
#[derive(Debug, Default, Clone, Copy)]
pub struct EzipDriver;

impl EzipDriver {
    /// Build the complete request, headers included
    pub fn build_request(config: &UpdateConfig) -> Result<String> {
        let mut request = RequestBuilder::default();

        request
            .raw(&format!("GET {}?mode=update&", config.request))?
            .param("ipaddress", &config.address)?
            .param("wildcard", if config.wildcard { "yes" } else { "no" })?
            .param("mx", &config.mx)?
            .param("url", &config.url)?
            .param("host", &config.host)?
            .line(" HTTP/1.0")?;
        http::write_headers(&mut request, config)?;
        request.line("")?;

        Ok(request.finish())
    }
}

#[async_trait]
impl ProtocolDriver for EzipDriver {
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

        http::check_status(&reply)?;
        tracing::debug!(host = %config.host, "request successful");
        Ok(())
    }

    fn requires_address(&self) -> bool {
        false
    }

    fn driver_name(&self) -> &'static str {
        "ezip"
    }
}
