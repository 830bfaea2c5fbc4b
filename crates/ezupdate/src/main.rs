// # ezupdate - Dynamic DNS Update Client
//
// Thin integration layer: flags and config file in, one update or a daemon
// loop out. Protocol, retry and scheduling logic live in the library crates.
//
// The binary is responsible for:
// 1. Merging flags over the configuration file
// 2. Initializing logging and the runtime
// 3. Wiring OS signals to the scheduler's signal flag
// 4. Running one update, or the scheduler until shutdown
// 5. Mapping the outcome to an exit code
//
// ## Signals (Unix, daemon mode)
//
// - `SIGHUP`: re-read the configuration file
// - `SIGTERM`, `SIGUSR1`: poll the interface now
// - `SIGQUIT`, `SIGINT`: shut down
//
// ## Example
//
// ```bash
// ezupdate -S dyndns -u bob:secret -h home.dyndns.org -i ppp0 -d
// ```

mod cli;
mod settings;

use anyhow::Result;
use clap::Parser;
use ezupdate_core::events::DEFAULT_EVENT_CHANNEL_CAPACITY;
use ezupdate_core::{
    DaemonScheduler, Dispatcher, ErrorKind, EventSink, SignalFlag, TcpTransport,
};
use ezupdate_iface::InterfaceResolver;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use ezupdate_core::ControlSignal;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::cli::Cli;
use crate::settings::{FileReloader, Settings};

/// Exit codes for different termination scenarios
///
/// - 0: Update published, or clean daemon shutdown
/// - 1: Configuration or startup precondition error
/// - 2: Update failed, or runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EzExitCode {
    /// Success or clean shutdown
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// The update could not be published, or the runtime failed
    RuntimeError = 2,
}

impl From<EzExitCode> for ExitCode {
    fn from(code: EzExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&ezupdate_core::Error> for EzExitCode {
    fn from(e: &ezupdate_core::Error) -> Self {
        match e.kind() {
            ErrorKind::Config => EzExitCode::ConfigError,
            _ => EzExitCode::RuntimeError,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return EzExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return EzExitCode::ConfigError.into();
    }

    info!(
        service = settings.service.id,
        server = %settings.config.server,
        host = %settings.config.host,
        "ezupdate {} starting",
        env!("CARGO_PKG_VERSION")
    );

    // Updates are strictly sequential; one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return EzExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(cli, settings)).into()
}

async fn run(cli: Cli, settings: Settings) -> EzExitCode {
    let service = settings.service;
    let daemon = settings.daemon;
    let signals = SignalFlag::new();

    let (events, mut rx) = EventSink::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!(?event, "engine event");
        }
    });

    let mut scheduler = DaemonScheduler::new(
        Box::new(InterfaceResolver::new()),
        service.driver,
        Dispatcher::new(Box::new(TcpTransport::new())),
        settings.config,
        signals.clone(),
    )
    .with_events(events);

    if !daemon {
        return match scheduler.run_once().await {
            Ok(()) => EzExitCode::CleanShutdown,
            Err(e) => {
                error!(service = service.id, "update failed: {}", e);
                EzExitCode::from(&e)
            }
        };
    }

    if let Err(e) = listen_for_signals(signals) {
        error!("Failed to install signal handlers: {:#}", e);
        return EzExitCode::RuntimeError;
    }

    scheduler = scheduler.with_reloader(Box::new(FileReloader::new(cli, service)));

    match scheduler.run().await {
        Ok(()) => {
            info!("Shutting down");
            EzExitCode::CleanShutdown
        }
        Err(e) => {
            error!(service = service.id, "daemon cannot start: {}", e);
            EzExitCode::from(&e)
        }
    }
}

/// What each OS signal asks of the scheduler
///
/// `SIGTERM` wakes the daemon for an immediate update, so ip-up style hooks
/// can `kill -TERM` it after a link change. `SIGQUIT` and `SIGINT` stop it.
#[cfg(unix)]
fn signal_table() -> [(SignalKind, &'static str, ControlSignal); 5] {
    [
        (SignalKind::hangup(), "SIGHUP", ControlSignal::Reload),
        (SignalKind::terminate(), "SIGTERM", ControlSignal::Wake),
        (SignalKind::user_defined1(), "SIGUSR1", ControlSignal::Wake),
        (SignalKind::quit(), "SIGQUIT", ControlSignal::Shutdown),
        (SignalKind::interrupt(), "SIGINT", ControlSignal::Shutdown),
    ]
}

/// Forward OS signals to `flag`
///
/// The listener tasks do nothing but raise the flag; the scheduler decides
/// what a signal means.
#[cfg(unix)]
fn listen_for_signals(flag: SignalFlag) -> Result<()> {
    for (kind, name, control) in signal_table() {
        let mut stream = signal(kind)
            .map_err(|e| anyhow::anyhow!("Failed to setup {} handler: {}", name, e))?;
        let flag = flag.clone();

        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                debug!(signal = name, %control, "OS signal");
                flag.raise(control);
            }
        });
    }

    Ok(())
}

/// Ctrl-C shuts down on platforms without Unix signals
#[cfg(not(unix))]
fn listen_for_signals(flag: SignalFlag) -> Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.raise(ezupdate_core::ControlSignal::Shutdown);
        }
    });

    Ok(())
}
