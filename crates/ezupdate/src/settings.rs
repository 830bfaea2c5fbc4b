//! Settings assembly
//!
//! Flags win over the configuration file, and the file wins over the
//! selected service's defaults. The file uses the long flag names as keys:
//!
//! ```toml
//! service-type = "dyndns"
//! user = "bob:secret"
//! host = "home.dyndns.org"
//! interface = "ppp0"
//! daemon = true
//! period = 300
//! ```

use anyhow::{Context, Result};
use ezupdate_core::{ConfigReloader, Credentials, ServiceDescriptor, UpdateConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

use crate::cli::Cli;

/// Log level used when none is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub address: Option<String>,
    pub daemon: Option<bool>,
    pub host: Option<String>,
    pub interface: Option<String>,
    pub cloak_title: Option<String>,
    pub mx: Option<String>,
    pub max_interval: Option<u64>,
    pub resolv_period: Option<u64>,
    pub period: Option<u64>,
    pub quiet: Option<bool>,
    #[serde(alias = "retrys")]
    pub retries: Option<usize>,
    pub server: Option<String>,
    pub service_type: Option<String>,
    pub timeout: Option<f64>,
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub wildcard: Option<bool>,
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }
}

/// Everything the binary needs to start
#[derive(Debug, Clone)]
pub struct Settings {
    pub service: &'static ServiceDescriptor,
    pub config: UpdateConfig,
    pub daemon: bool,
    pub quiet: bool,
    pub log_level: String,
}

impl Settings {
    /// Read the file named by `--config-file`, if any, and merge the flags over it
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config_file {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// Merge flags over file values over service defaults, then validate
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self> {
        let service_id = pick(&cli.service_type, file.service_type)
            .unwrap_or_else(|| ezupdate_services::DEFAULT_SERVICE.to_string());
        let service = ezupdate_services::registry().get(&service_id)?;

        let mut config = UpdateConfig::default();

        if let Some(server) = pick(&cli.server, file.server) {
            let (host, port) = match server.split_once(':') {
                Some((host, port)) => (host.to_string(), port.to_string()),
                None => (server, String::new()),
            };
            config.server = host;
            config.port = port;
        }
        config.apply_service_defaults(service);

        let user = pick(&cli.user, file.user).unwrap_or_default();
        let credentials = Credentials::parse(&user);
        config.credentials = match pick(&cli.password, file.password) {
            Some(password) => Credentials::new(credentials.username(), password),
            None => credentials,
        };

        if let Some(host) = pick(&cli.host, file.host) {
            config.host = host;
        }
        if let Some(address) = pick(&cli.address, file.address) {
            config.address = address;
        }
        if let Some(interface) = pick(&cli.interface, file.interface) {
            config.interface = interface;
        }
        if let Some(mx) = pick(&cli.mx, file.mx) {
            config.mx = mx;
        }
        if let Some(url) = pick(&cli.url, file.url) {
            config.url = url;
        }
        if let Some(title) = pick(&cli.cloak_title, file.cloak_title) {
            config.cloak_title = title;
        }
        config.wildcard = cli.wildcard || file.wildcard.unwrap_or(false);

        if let Some(timeout) = cli.timeout.or(file.timeout) {
            config.timeout = Duration::try_from_secs_f64(timeout)
                .with_context(|| format!("invalid timeout: {}", timeout))?;
        }
        if let Some(retries) = cli.retries.or(file.retries) {
            config.retries = retries;
        }
        if let Some(secs) = cli.period.or(file.period) {
            config.update_period = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.resolv_period.or(file.resolv_period) {
            config.resolve_period = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.max_interval.or(file.max_interval) {
            config.max_interval = Duration::from_secs(secs);
        }

        let log_level =
            pick(&cli.log_level, file.log_level).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let settings = Self {
            service,
            config,
            daemon: cli.daemon || file.daemon.unwrap_or(false),
            quiet: cli.quiet || file.quiet.unwrap_or(false),
            log_level,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()?;

        if self.daemon && self.config.update_period.is_zero() {
            anyhow::bail!("period must be at least one second in daemon mode");
        }

        parse_level(&self.log_level)?;
        Ok(())
    }

    /// Effective log level; quiet mode never goes below `warn`
    pub fn level(&self) -> Level {
        let level = parse_level(&self.log_level).unwrap_or(Level::INFO);
        if self.quiet { level.min(Level::WARN) } else { level }
    }
}

/// Flag value if given, else the file's
fn pick(flag: &Option<String>, file: Option<String>) -> Option<String> {
    flag.clone().or(file)
}

fn parse_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Re-reads the configuration file on reload, flags still on top
///
/// The service is fixed for the life of the process.
pub struct FileReloader {
    cli: Cli,
    service: &'static ServiceDescriptor,
}

impl FileReloader {
    pub fn new(cli: Cli, service: &'static ServiceDescriptor) -> Self {
        Self { cli, service }
    }
}

impl ConfigReloader for FileReloader {
    fn reload(&self) -> Result<UpdateConfig> {
        let settings = Settings::load(&self.cli)?;

        if settings.service.id != self.service.id {
            anyhow::bail!(
                "service type cannot change on reload ({} -> {})",
                self.service.id,
                settings.service.id
            );
        }

        Ok(settings.config)
    }
}
