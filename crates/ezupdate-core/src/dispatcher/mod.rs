//! Update dispatcher
//!
//! Runs a driver against the configured provider and applies the retry
//! policy. The dispatcher owns the transport, so drivers never open
//! connections behind its back and tests can swap in a scripted one.
//!
//! ## Retry Policy
//!
//! ```text
//! preconditions ─┬─ fail ──────────────────────────────► Err (no I/O)
//!                └─ ok ─► attempt 1 ─ fail ─► pause ─► attempt 2 ─ ... ─► attempt n
//!                              │                           │                  │
//!                              └──────── ok ───────────────┴──────────────────┴─► Ok
//! ```
//!
//! Every failure kind is retried except configuration errors, which cannot
//! change between attempts.

use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::UpdateConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::events::{AgentEvent, EventSink};
use crate::traits::{ProtocolDriver, Transport};

/// Pause between two attempts of the same update
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(5);

/// Retry-aware runner invoking a driver once per attempt
pub struct Dispatcher {
    /// Transport handed to every driver invocation
    transport: Box<dyn Transport>,

    /// Pause between attempts
    retry_pause: Duration,

    /// Event sink for attempt/pause/outcome events
    events: EventSink,
}

impl Dispatcher {
    /// Create a dispatcher using `transport`
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            retry_pause: DEFAULT_RETRY_PAUSE,
            events: EventSink::disabled(),
        }
    }

    /// Set the pause between attempts
    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    /// Report attempts and outcomes to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn retry_pause(&self) -> Duration {
        self.retry_pause
    }

    /// Check preconditions and run a single attempt
    pub async fn run_once(&self, driver: &dyn ProtocolDriver, config: &UpdateConfig) -> Result<()> {
        self.run_with_retries(driver, config, 1).await
    }

    /// Check preconditions and run up to `tries` attempts
    ///
    /// # Returns
    ///
    /// - `Ok(())`: some attempt succeeded
    /// - `Err(Error)`: the precondition failure, or the last attempt's error
    pub async fn run_with_retries(
        &self,
        driver: &dyn ProtocolDriver,
        config: &UpdateConfig,
        tries: usize,
    ) -> Result<()> {
        driver.check_preconditions(config)?;

        let tries = tries.max(1);
        let address = config.address.parse::<Ipv4Addr>().ok();
        let service = driver.driver_name();
        let mut last_error = None;

        for attempt in 1..=tries {
            self.events.emit(AgentEvent::AttemptStarted {
                attempt,
                max_attempts: tries,
            });
            debug!(service, server = %config.server, attempt, "update attempt {}/{}", attempt, tries);

            match driver.update(config, self.transport.as_ref()).await {
                Ok(()) => {
                    info!(service, host = %config.host, address = %config.address, "update successful");
                    self.events.emit(AgentEvent::UpdateSucceeded {
                        address,
                        attempts: attempt,
                    });
                    return Ok(());
                }
                Err(e) => {
                    let kind = e.kind();
                    warn!(service, attempt, %kind, "update attempt failed: {}", e);
                    self.events.emit(AgentEvent::AttemptFailed {
                        attempt,
                        kind,
                        error: e.to_string(),
                    });

                    let terminal = kind == ErrorKind::Config;
                    last_error = Some(e);

                    if terminal {
                        break;
                    }

                    if attempt < tries {
                        self.events.emit(AgentEvent::RetryPause {
                            after_attempt: attempt,
                            delay: self.retry_pause,
                        });
                        debug!(delay = ?self.retry_pause, "pausing before retry");
                        tokio::time::sleep(self.retry_pause).await;
                    }
                }
            }
        }

        let error = last_error.unwrap_or_else(|| Error::config("no update attempt was made"));
        self.events.emit(AgentEvent::UpdateFailed {
            address,
            error: error.to_string(),
        });
        Err(error)
    }
}
