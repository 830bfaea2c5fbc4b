//! Test doubles and common utilities for contract tests
//!
//! These doubles record what the dispatcher and scheduler ask of them
//! without touching the network or the host's interfaces.

#![allow(dead_code)]

use async_trait::async_trait;
use ezupdate_core::error::{Result, TransportError};
use ezupdate_core::{
    AddressResolver, AgentEvent, ConfigReloader, ControlSignal, Connection, Credentials, Error,
    ProtocolDriver, SignalFlag, Transport, UpdateConfig,
};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// A driver that fails a fixed number of times, then succeeds
pub struct ScriptedDriver {
    /// Failures left before the first success
    failures_left: AtomicUsize,
    /// Call counter for update()
    update_call_count: Arc<AtomicUsize>,
    /// Config snapshot of every update() call
    seen: Arc<Mutex<Vec<UpdateConfig>>>,
    /// Answer of requires_address()
    requires_address: bool,
}

impl ScriptedDriver {
    /// A driver that always succeeds
    pub fn succeeding() -> Self {
        Self::failing_first(0)
    }

    /// A driver whose first `failures` updates fail with a network error
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
            requires_address: true,
        }
    }

    /// Let the server detect the address, like EZIP
    pub fn address_optional(mut self) -> Self {
        self.requires_address = false;
        self
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Addresses published, in call order
    pub fn addresses(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|config| config.address.clone())
            .collect()
    }

    /// Hosts updated, in call order
    pub fn hosts(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|config| config.host.clone())
            .collect()
    }
}

#[async_trait]
impl ProtocolDriver for ScriptedDriver {
    async fn update(&self, config: &UpdateConfig, _transport: &dyn Transport) -> Result<()> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(config.clone());

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();

        if failing {
            Err(Error::from(TransportError::Closed))
        } else {
            Ok(())
        }
    }

    fn requires_address(&self) -> bool {
        self.requires_address
    }

    fn driver_name(&self) -> &'static str {
        "scripted"
    }
}

/// A resolver replaying a fixed sequence of answers
///
/// `None` entries are resolve failures. Once the script is exhausted the
/// resolver raises [`ControlSignal::Shutdown`] and fails, so a scheduler
/// under test stops after consuming every answer.
pub struct ScriptedResolver {
    script: Mutex<VecDeque<Option<Ipv4Addr>>>,
    repeat_last: bool,
    last: Mutex<Option<Ipv4Addr>>,
    signals: SignalFlag,
    resolve_call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    /// Answer with `script`, then shut the scheduler down
    pub fn new(script: Vec<Option<Ipv4Addr>>, signals: SignalFlag) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat_last: false,
            last: Mutex::new(None),
            signals,
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer `address` forever
    pub fn constant(address: Ipv4Addr) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat_last: true,
            last: Mutex::new(Some(address)),
            signals: SignalFlag::new(),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer with `script`, then repeat its last answer forever
    pub fn then_constant(script: Vec<Option<Ipv4Addr>>) -> Self {
        let last = script.last().copied().flatten();
        Self {
            script: Mutex::new(script.into()),
            repeat_last: true,
            last: Mutex::new(last),
            signals: SignalFlag::new(),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle on the call counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.resolve_call_count.clone()
    }
}

#[async_trait]
impl AddressResolver for ScriptedResolver {
    async fn resolve(&self, interface: &str) -> Result<Ipv4Addr> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let answer = match next {
            Some(answer) => answer,
            None if self.repeat_last => *self.last.lock().unwrap(),
            None => {
                self.signals.raise(ControlSignal::Shutdown);
                None
            }
        };

        answer.ok_or_else(|| Error::interface(format!("{}: no IPv4 address", interface)))
    }
}

/// A transport that must never be used
pub struct NullTransport {
    connect_call_count: Arc<AtomicUsize>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self {
            connect_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Transport for NullTransport {
    async fn connect(
        &self,
        _host: &str,
        _port: &str,
        _timeout: Duration,
    ) -> std::result::Result<Box<dyn Connection>, TransportError> {
        self.connect_call_count.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Closed)
    }
}

/// A reloader handing out a fixed answer
pub struct StaticReloader {
    answer: std::result::Result<UpdateConfig, String>,
    reload_call_count: Arc<AtomicUsize>,
}

impl StaticReloader {
    pub fn returning(config: UpdateConfig) -> Self {
        Self {
            answer: Ok(config),
            reload_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            reload_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.reload_call_count.clone()
    }
}

impl ConfigReloader for StaticReloader {
    fn reload(&self) -> anyhow::Result<UpdateConfig> {
        self.reload_call_count.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(config) => Ok(config.clone()),
            Err(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

/// A valid configuration with fast periods for scheduler tests
pub fn fast_config() -> UpdateConfig {
    let mut config = UpdateConfig::default()
        .with_server("members.example.net", "80")
        .with_credentials(Credentials::new("bob", "secret"))
        .with_host("home.example.net")
        .with_timeout(Duration::from_secs(1));
    config.interface = "test0".to_string();
    config.update_period = Duration::from_millis(5);
    config.resolve_period = Duration::from_millis(5);
    config
}

/// Drain every event currently queued
pub fn drain_events(rx: &mut mpsc::Receiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
