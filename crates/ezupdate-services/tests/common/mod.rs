//! Scripted transport for driver contract tests
//!
//! Each `connect` takes the next script off a queue. A script is either a
//! `tokio-test` I/O mock, which checks every byte the driver writes and feeds
//! back canned replies, or a connection failure.

#![allow(dead_code)]

use async_trait::async_trait;
use ezupdate_core::{Connection, Credentials, TimedConnection, Transport, TransportError, UpdateConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::io::{Builder, Mock};

/// What one connection attempt does
pub enum Script {
    /// Connect succeeds; traffic follows the mock
    Connect(Mock),
    /// Connect is refused
    Refuse,
}

/// A transport replaying [`Script`]s in order
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    connect_call_count: Arc<AtomicUsize>,
    connect_times: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            connect_call_count: Arc::new(AtomicUsize::new(0)),
            connect_times: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A single connection following `mock`
    pub fn single(mock: Mock) -> Self {
        Self::new(vec![Script::Connect(mock)])
    }

    /// Get the number of times connect() was called
    pub fn connect_call_count(&self) -> usize {
        self.connect_call_count.load(Ordering::SeqCst)
    }

    /// Shared handle on the connect counter, readable after the transport is moved
    pub fn connect_counter(&self) -> Arc<AtomicUsize> {
        self.connect_call_count.clone()
    }

    /// When each connect() happened
    pub fn connect_times(&self) -> Vec<Instant> {
        self.connect_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(
        &self,
        host: &str,
        port: &str,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, TransportError> {
        self.connect_call_count.fetch_add(1, Ordering::SeqCst);
        self.connect_times.lock().unwrap().push(Instant::now());

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected connect: no script left");

        match script {
            Script::Connect(mock) => Ok(Box::new(TimedConnection::new(
                mock,
                format!("{}:{}", host, port),
                timeout,
            ))),
            Script::Refuse => Err(TransportError::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            ))),
        }
    }
}

/// A mock that expects `request` and answers `reply`, then closes
pub fn http_exchange(request: &str, reply: &[u8]) -> Mock {
    Builder::new().write(request.as_bytes()).read(reply).build()
}

/// Base configuration shared by the driver tests
pub fn config(server: &str, port: &str, request: &str, host: &str) -> UpdateConfig {
    let mut config = UpdateConfig::default()
        .with_server(server, port)
        .with_credentials(Credentials::new("bob", "hunter2"))
        .with_host(host)
        .with_timeout(Duration::from_secs(2));
    config.request = request.to_string();
    config.address = "192.0.2.7".to_string();
    config
}
