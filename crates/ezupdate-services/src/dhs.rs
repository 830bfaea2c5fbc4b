//! DHS dialect
//!
//! Updates are form `POST`s. The provider cannot change the address and the
//! mail exchanger in one request, so a non-empty mx costs a second request,
//! sent after a pacing delay because the provider drops requests that follow
//! each other too closely.

use async_trait::async_trait;
use ezupdate_core::{Error, ProtocolDriver, RequestBuilder, Result, Transport, UpdateConfig};
use std::time::Duration;

use crate::http;

/// Upper bound on the pause between the two requests
pub const PACING_LIMIT: Duration = Duration::from_secs(60);

/// The two kinds of DHS update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    /// Publish the address
    Online,
    /// Publish the mail exchanger
    MailExchanger,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Online => "Online",
            UpdateType::MailExchanger => "Update+Mail+Exchanger",
        }
    }
}

/// Split `label.domain` at the first dot
///
/// # Returns
///
/// - `Ok((label, domain))`
/// - `Err(Error::Config)`: no dot, or nothing after it
pub fn split_host(host: &str) -> Result<(&str, &str)> {
    let Some((label, domain)) = host.split_once('.') else {
        return Err(Error::config(format!(
            "error parsing hostname from host {:?}",
            host
        )));
    };

    if domain.is_empty() {
        return Err(Error::config(format!(
            "error parsing domain from host {:?}",
            host
        )));
    }

    Ok((label, domain))
}

/// Driver for DHS style providers
#[derive(Debug, Default, Clone, Copy)]
pub struct DhsDriver {
    /// Fixed pause between the requests; `None` means min(60 s, timeout)
    pacing: Option<Duration>,
}

impl DhsDriver {
    pub const fn new() -> Self {
        Self { pacing: None }
    }

    /// Use a fixed pause between the two requests
    pub const fn with_pacing(pacing: Duration) -> Self {
        Self {
            pacing: Some(pacing),
        }
    }

    /// Pause applied before the mail exchanger request
    pub fn pacing_for(&self, config: &UpdateConfig) -> Duration {
        self.pacing
            .unwrap_or_else(|| PACING_LIMIT.min(config.timeout))
    }

    /// Build the form body
    pub fn build_body(
        config: &UpdateConfig,
        label: &str,
        domain: &str,
        update_type: UpdateType,
    ) -> Result<String> {
        let mut body = RequestBuilder::default();

        body.raw("hostscmd=edit&hostscmdstage=2&type=4&")?
            .param("updatetype", update_type.as_str())?
            .param("ip", &config.address)?
            .param("mx", &config.mx)?
            .param("offline_url", &config.url)?;

        if config.cloak_title.is_empty() {
            body.param("cloak_title", "")?;
        } else {
            body.param("cloak", "Y")?
                .param("cloak_title", &config.cloak_title)?;
        }

        body.param("submit", "Update")?
            .param("domain", domain)?
            .param_last("hostname", label)?;

        Ok(body.finish())
    }

    /// Build the complete request: request line, headers, body
    pub fn build_request(
        config: &UpdateConfig,
        label: &str,
        domain: &str,
        update_type: UpdateType,
    ) -> Result<String> {
        let body = Self::build_body(config, label, domain, update_type)?;

        let mut head = RequestBuilder::default();
        head.line(&format!("POST {} HTTP/1.0", config.request))?;
        http::write_headers(&mut head, config)?;
        head.line(&format!("Content-length: {}", body.len()))?
            .line("")?;

        Ok(format!("{}{}\r\n", head.finish(), body))
    }

    async fn post(transport: &dyn Transport, config: &UpdateConfig, request: &str) -> Result<()> {
        let reply = http::exchange(transport, config, request).await?;
        http::check_status(&reply)?;
        Ok(())
    }
}

#[async_trait]
impl ProtocolDriver for DhsDriver {
    fn check_preconditions(&self, config: &UpdateConfig) -> Result<()> {
        config.validate()?;
        split_host(&config.host)?;
        Ok(())
    }

    async fn update(&self, config: &UpdateConfig, transport: &dyn Transport) -> Result<()> {
        let (label, domain) = split_host(&config.host)?;
        tracing::debug!(hostname = label, domain, "split host");

        // Build both requests up front so an oversized field fails before any I/O
        let online = Self::build_request(config, label, domain, UpdateType::Online)?;
        let mail_exchanger = if config.mx.is_empty() {
            None
        } else {
            Some(Self::build_request(
                config,
                label,
                domain,
                UpdateType::MailExchanger,
            )?)
        };

        Self::post(transport, config, &online).await?;
        tracing::debug!(host = %config.host, "address update successful");

        if let Some(request) = mail_exchanger {
            let pause = self.pacing_for(config);
            tracing::debug!(?pause, "pausing before mail exchanger update");
            tokio::time::sleep(pause).await;

            Self::post(transport, config, &request).await?;
            tracing::debug!(host = %config.host, mx = %config.mx, "mail exchanger update successful");
        }

        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "dhs"
    }
}
