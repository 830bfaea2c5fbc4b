//! Command line flags
//!
//! `-h` selects the host to update, as it always has for this client, so
//! help lives on `-H`/`--help`.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "ezupdate",
    version,
    about = "Keep a dynamic DNS record pointed at this machine's address",
    disable_help_flag = true
)]
pub struct Cli {
    /// Address to publish instead of the interface's
    #[arg(short = 'a', long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// TOML configuration file
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Keep running and publish every address change
    #[arg(short = 'd', long)]
    pub daemon: bool,

    /// Host name(s) to update
    #[arg(short = 'h', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Interface whose address is published
    #[arg(short = 'i', long, value_name = "IFACE")]
    pub interface: Option<String>,

    /// Cloak title (DHS)
    #[arg(short = 'L', long = "cloak-title", value_name = "TITLE")]
    pub cloak_title: Option<String>,

    /// Mail exchanger
    #[arg(short = 'm', long, value_name = "MX")]
    pub mx: Option<String>,

    /// Force an update after this many seconds without one
    #[arg(short = 'M', long = "max-interval", value_name = "SECS")]
    pub max_interval: Option<u64>,

    /// Seconds between polls while the interface is unresolvable
    #[arg(short = 'p', long = "resolv-period", value_name = "SECS")]
    pub resolv_period: Option<u64>,

    /// Seconds between address polls in daemon mode
    #[arg(short = 'P', long = "period", value_name = "SECS")]
    pub period: Option<u64>,

    /// Only log warnings and errors
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Attempts per one-shot update
    #[arg(short = 'r', long, visible_alias = "retrys", value_name = "N")]
    pub retries: Option<usize>,

    /// Provider server
    #[arg(short = 's', long, value_name = "HOST[:PORT]")]
    pub server: Option<String>,

    /// Provider, e.g. ezip, dyndns, dhs, pgpow
    #[arg(short = 'S', long = "service-type", value_name = "SERVICE")]
    pub service_type: Option<String>,

    /// Network timeout in seconds (fractions allowed)
    #[arg(short = 't', long, value_name = "SEC.FRAC")]
    pub timeout: Option<f64>,

    /// Redirect / offline URL
    #[arg(short = 'U', long, value_name = "URL")]
    pub url: Option<String>,

    /// Account as name[:password]
    #[arg(short = 'u', long, value_name = "NAME[:PASSWORD]")]
    pub user: Option<String>,

    /// Ask the provider for a wildcard record
    #[arg(short = 'w', long)]
    pub wildcard: bool,

    /// Account password, overrides the one given with --user
    #[arg(long, env = "EZUPDATE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// trace, debug, info, warn or error
    #[arg(long = "log-level", env = "EZUPDATE_LOG_LEVEL", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print help
    #[arg(short = 'H', long, action = ArgAction::Help)]
    pub help: Option<bool>,
}
