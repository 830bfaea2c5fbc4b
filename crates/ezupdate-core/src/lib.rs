// # ezupdate-core
//
// Core library for the ezupdate dynamic DNS update agent.
//
// ## Architecture Overview
//
// - **ProtocolDriver**: Trait speaking one provider's update dialect
// - **AddressResolver**: Trait looking up an interface's IPv4 address
// - **Transport / Connection**: Timed byte streams to a provider
// - **ServiceRegistry**: Static table of providers and their defaults
// - **Dispatcher**: Runs a driver with the retry policy
// - **DaemonScheduler**: Polls, detects changes and reacts to control signals
//
// ## Design Principles
//
// 1. **Closed set of dialects**: drivers live in a static table, no runtime registration
// 2. **Explicit state**: configuration and per-attempt connection state are passed, never global
// 3. **Bounded blocking**: every network operation carries a timeout
// 4. **Library-first**: the daemon binary only wires these pieces together

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod request;
pub mod signal;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use config::{Credentials, UpdateConfig};
pub use dispatcher::{DEFAULT_RETRY_PAUSE, Dispatcher};
pub use engine::{ConfigReloader, DaemonScheduler, DaemonState, SchedulerState};
pub use error::{Error, ErrorKind, Result, TransportError};
pub use events::{AgentEvent, EventSink};
pub use registry::{ServiceDescriptor, ServiceRegistry};
pub use request::RequestBuilder;
pub use signal::{ControlSignal, SignalFlag};
pub use traits::{AddressResolver, Connection, ProtocolDriver, Transport};
pub use transport::{ConnectionState, RESPONSE_BUFFER_SIZE, TcpTransport, TimedConnection};
