//! Agent events
//!
//! The dispatcher and the scheduler report what they do on a bounded channel
//! so the daemon (or a test) can observe progress without parsing logs.
//! Emission never blocks: when the channel is full the event is dropped and a
//! warning is logged.

use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::ErrorKind;
use crate::signal::ControlSignal;

/// Default capacity of the event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events emitted by the dispatcher and the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Scheduler started
    Started {
        service: &'static str,
        interface: String,
    },

    /// An update attempt is about to run
    AttemptStarted {
        attempt: usize,
        max_attempts: usize,
    },

    /// An update attempt failed
    AttemptFailed {
        attempt: usize,
        kind: ErrorKind,
        error: String,
    },

    /// Waiting before the next attempt
    RetryPause {
        after_attempt: usize,
        delay: Duration,
    },

    /// The provider accepted the update
    UpdateSucceeded {
        address: Option<Ipv4Addr>,
        attempts: usize,
    },

    /// Every attempt failed
    UpdateFailed {
        address: Option<Ipv4Addr>,
        error: String,
    },

    /// The watched interface has no usable address
    InterfaceUnresolved { interface: String, error: String },

    /// The watched interface has an address again
    InterfaceRecovered {
        interface: String,
        address: Ipv4Addr,
    },

    /// A control signal was drained
    SignalReceived { signal: ControlSignal },

    /// Configuration was re-read
    ConfigReloaded,

    /// Re-reading configuration failed; the previous one stays active
    ConfigReloadFailed { error: String },

    /// Scheduler stopped
    Stopped { reason: String },
}

/// Sending half of the event channel
///
/// A disabled sink discards everything, which is what one-shot runs and most
/// tests use.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<AgentEvent>>,
}

impl EventSink {
    /// Create a sink and the receiver observing it
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AgentEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event without waiting
    pub fn emit(&self, event: AgentEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "Event channel full, dropping event");
            }
            // Nobody is listening any more
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
