//! Daemon scheduler
//!
//! The scheduler polls the watched interface, compares the address against
//! the last one the provider confirmed, and hands changes to the
//! [`Dispatcher`]. Between polls it sleeps, and any control signal cuts the
//! sleep short.
//!
//! ## State Machine
//!
//! ```text
//!              resolve failed (resolve_period)
//!         ┌──────────────────────────────────────┐
//!         ▼                                      │
//!   ┌──────────┐  changed / stale   ┌──────────┐ │
//!   │ Polling  │───────────────────►│ Updating │ │
//!   └──────────┘                    └──────────┘ │
//!      ▲    │ unchanged (update_period)   │      │
//!      │    ▼                             ▼      │
//!      │  ┌──────────────────────────────────┐   │
//!      └──│             Sleeping             │◄──┘
//!  reload └──────────────────────────────────┘
//!  / wake                 │ shutdown
//!                         ▼
//!                  ┌──────────────┐
//!                  │ ShuttingDown │
//!                  └──────────────┘
//! ```
//!
//! A failed update leaves the last confirmed address untouched, so the next
//! poll sees the same address as changed and tries again.

use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::UpdateConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::events::{AgentEvent, EventSink};
use crate::signal::{ControlSignal, SignalFlag};
use crate::traits::{AddressResolver, ProtocolDriver};

/// Scheduler states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Resolve the interface address
    Polling,
    /// Publish this address
    Updating(Ipv4Addr),
    /// Wait this long, or until a signal arrives
    Sleeping(Duration),
    /// Terminal
    ShuttingDown,
}

/// What the scheduler remembers between polls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaemonState {
    /// Address the provider last confirmed
    pub last_address: Option<Ipv4Addr>,

    /// When the provider last confirmed an update
    pub last_update: Option<Instant>,

    /// A resolve failure has already been reported in the current streak
    pub resolve_warned: bool,
}

impl DaemonState {
    /// Whether `address` has to be published at `now`
    ///
    /// True when the address differs from the last confirmed one, or when
    /// `max_interval` is non-zero and more than that has passed since the last
    /// confirmed update.
    pub fn needs_update(&self, address: Ipv4Addr, now: Instant, max_interval: Duration) -> bool {
        if self.last_address != Some(address) {
            return true;
        }

        if max_interval.is_zero() {
            return false;
        }

        match self.last_update {
            Some(at) => now.saturating_duration_since(at) > max_interval,
            None => true,
        }
    }

    /// Remember a confirmed update
    pub fn record_success(&mut self, address: Ipv4Addr, now: Instant) {
        self.last_address = Some(address);
        self.last_update = Some(now);
    }
}

/// Source of a fresh configuration on reload
pub trait ConfigReloader: Send + Sync {
    /// Re-read the configuration from wherever it came from
    fn reload(&self) -> anyhow::Result<UpdateConfig>;
}

/// Polling loop driving one provider
///
/// ## Lifecycle
///
/// 1. Create with [`DaemonScheduler::new()`]
/// 2. Either [`DaemonScheduler::run()`] until shutdown, or
///    [`DaemonScheduler::run_once()`] for a single update
pub struct DaemonScheduler<'d> {
    /// Interface address lookups
    resolver: Box<dyn AddressResolver>,

    /// Provider dialect
    driver: &'d dyn ProtocolDriver,

    /// Retry-aware runner
    dispatcher: Dispatcher,

    /// Active configuration
    config: UpdateConfig,

    /// Pending control signal
    signals: SignalFlag,

    /// Reload source
    reloader: Option<Box<dyn ConfigReloader>>,

    /// Event sink
    events: EventSink,

    /// Change detection state
    state: DaemonState,
}

impl<'d> DaemonScheduler<'d> {
    pub fn new(
        resolver: Box<dyn AddressResolver>,
        driver: &'d dyn ProtocolDriver,
        dispatcher: Dispatcher,
        config: UpdateConfig,
        signals: SignalFlag,
    ) -> Self {
        Self {
            resolver,
            driver,
            dispatcher,
            config,
            signals,
            reloader: None,
            events: EventSink::disabled(),
            state: DaemonState::default(),
        }
    }

    /// Re-read configuration through `reloader` on [`ControlSignal::Reload`]
    pub fn with_reloader(mut self, reloader: Box<dyn ConfigReloader>) -> Self {
        self.reloader = Some(reloader);
        self
    }

    /// Report scheduler and dispatcher events to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.dispatcher = self.dispatcher.with_events(events.clone());
        self.events = events;
        self
    }

    pub fn state(&self) -> &DaemonState {
        &self.state
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Run until a shutdown signal
    ///
    /// # Returns
    ///
    /// - `Ok(())`: clean shutdown
    /// - `Err(Error)`: the driver's startup preconditions failed
    pub async fn run(&mut self) -> Result<()> {
        self.driver.check_preconditions(&self.config)?;

        info!(
            service = self.driver.driver_name(),
            interface = %self.config.interface,
            server = %self.config.server,
            "daemon started"
        );
        self.events.emit(AgentEvent::Started {
            service: self.driver.driver_name(),
            interface: self.config.interface.clone(),
        });

        let mut next = SchedulerState::Polling;
        loop {
            next = match next {
                SchedulerState::Polling => self.poll().await,
                SchedulerState::Updating(address) => self.update(address).await,
                SchedulerState::Sleeping(period) => self.sleep(period).await,
                SchedulerState::ShuttingDown => break,
            };
        }

        info!("daemon stopped");
        self.events.emit(AgentEvent::Stopped {
            reason: "shutdown signal".to_string(),
        });
        Ok(())
    }

    /// Single update with the dispatcher's retry policy
    ///
    /// Uses the configured address when one is set, otherwise the watched
    /// interface's. A resolve failure is only fatal for drivers that need an
    /// address.
    pub async fn run_once(&mut self) -> Result<()> {
        self.driver.check_preconditions(&self.config)?;

        let config = if !self.config.address.is_empty() {
            self.config.clone()
        } else {
            match self.resolver.resolve(&self.config.interface).await {
                Ok(address) => {
                    debug!(interface = %self.config.interface, %address, "resolved interface address");
                    self.config.with_address(address)
                }
                Err(e) if !self.driver.requires_address() => {
                    info!(interface = %self.config.interface, "{}; letting the server detect the address", e);
                    self.config.clone()
                }
                Err(e) => return Err(e),
            }
        };

        self.dispatcher
            .run_with_retries(self.driver, &config, self.config.retries)
            .await?;

        if let Ok(address) = config.address.parse::<Ipv4Addr>() {
            self.state.record_success(address, Instant::now());
        }
        Ok(())
    }

    async fn poll(&mut self) -> SchedulerState {
        let interface = &self.config.interface;

        match self.resolver.resolve(interface).await {
            Err(e) => {
                if !self.state.resolve_warned {
                    warn!(%interface, "unable to resolve interface address: {}", e);
                    self.events.emit(AgentEvent::InterfaceUnresolved {
                        interface: interface.clone(),
                        error: e.to_string(),
                    });
                    self.state.resolve_warned = true;
                } else {
                    debug!(%interface, "interface still unresolved: {}", e);
                }
                SchedulerState::Sleeping(self.config.resolve_period)
            }
            Ok(address) => {
                if self.state.resolve_warned {
                    info!(%interface, %address, "interface address available again");
                    self.events.emit(AgentEvent::InterfaceRecovered {
                        interface: interface.clone(),
                        address,
                    });
                    self.state.resolve_warned = false;
                }

                if self
                    .state
                    .needs_update(address, Instant::now(), self.config.max_interval)
                {
                    SchedulerState::Updating(address)
                } else {
                    debug!(%address, "address unchanged");
                    SchedulerState::Sleeping(self.config.update_period)
                }
            }
        }
    }

    async fn update(&mut self, address: Ipv4Addr) -> SchedulerState {
        let config = self.config.with_address(address);

        match self.dispatcher.run_once(self.driver, &config).await {
            Ok(()) => {
                info!(%address, previous = ?self.state.last_address, "address published");
                self.state.record_success(address, Instant::now());
            }
            Err(e) => {
                error!(%address, "update failed, will retry on next poll: {}", e);
            }
        }

        SchedulerState::Sleeping(self.config.update_period)
    }

    async fn sleep(&mut self, period: Duration) -> SchedulerState {
        debug!(?period, "sleeping");

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = self.signals.notified() => {}
        }

        self.drain_signal()
    }

    fn drain_signal(&mut self) -> SchedulerState {
        let Some(signal) = self.signals.take() else {
            return SchedulerState::Polling;
        };

        info!(%signal, "signal received");
        self.events.emit(AgentEvent::SignalReceived { signal });

        match signal {
            ControlSignal::Reload => {
                self.reload();
                SchedulerState::Polling
            }
            ControlSignal::Wake => SchedulerState::Polling,
            ControlSignal::Shutdown => SchedulerState::ShuttingDown,
        }
    }

    fn reload(&mut self) {
        let Some(reloader) = &self.reloader else {
            warn!("reload requested but no configuration source is set");
            return;
        };

        let fresh = reloader.reload().and_then(|config| {
            self.driver.check_preconditions(&config)?;
            Ok(config)
        });

        match fresh {
            Ok(config) => {
                if config != self.config {
                    // Publish again even if the address has not moved
                    self.state.last_address = None;
                }
                self.config = config;
                info!(server = %self.config.server, host = %self.config.host, "configuration reloaded");
                self.events.emit(AgentEvent::ConfigReloaded);
            }
            Err(e) => {
                error!("configuration reload failed, keeping previous configuration: {:#}", e);
                self.events.emit(AgentEvent::ConfigReloadFailed {
                    error: format!("{:#}", e),
                });
            }
        }
    }
}
