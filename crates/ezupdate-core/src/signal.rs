//! Pending control signal
//!
//! The OS signal listener and the scheduler share one [`SignalFlag`]. Raising
//! stores a single byte and wakes the scheduler if it is sleeping; the
//! scheduler drains the flag between loop iterations. Only the most recent
//! signal is kept.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Notify;

/// Control requests the scheduler understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlSignal {
    /// Re-read configuration
    Reload = 1,
    /// Poll immediately
    Wake = 2,
    /// Stop the scheduler
    Shutdown = 3,
}

impl ControlSignal {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ControlSignal::Reload),
            2 => Some(ControlSignal::Wake),
            3 => Some(ControlSignal::Shutdown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ControlSignal::Reload => "reload",
            ControlSignal::Wake => "wake",
            ControlSignal::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct Shared {
    pending: AtomicU8,
    notify: Notify,
}

/// Single-slot, last-wins control signal shared across tasks
#[derive(Debug, Clone, Default)]
pub struct SignalFlag {
    shared: Arc<Shared>,
}

impl SignalFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `signal`, replacing any pending one, and wake a sleeper
    pub fn raise(&self, signal: ControlSignal) {
        self.shared.pending.store(signal as u8, Ordering::SeqCst);
        self.shared.notify.notify_one();
    }

    /// Take the pending signal, leaving the flag empty
    pub fn take(&self) -> Option<ControlSignal> {
        ControlSignal::from_u8(self.shared.pending.swap(0, Ordering::SeqCst))
    }

    /// Peek at the pending signal
    pub fn pending(&self) -> Option<ControlSignal> {
        ControlSignal::from_u8(self.shared.pending.load(Ordering::SeqCst))
    }

    /// Wait until a signal is raised
    ///
    /// Returns immediately when a signal was raised since the last wait,
    /// even if nobody was waiting at the time.
    pub async fn notified(&self) {
        self.shared.notify.notified().await;
    }
}
