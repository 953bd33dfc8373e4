//! mensa-core: decentralized fork sharing between neighboring agents
//!
//! This crate provides:
//! - A pure philosopher state machine implementing dirty/clean fork passing
//! - Table bootstrap from ring, complete or custom topologies
//! - A tokio runtime that drives one task per philosopher
//! - A deterministic simulator that checks invariants after every step
//! - An event bus and JSONL event log for observing a table

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod fork;
pub mod mailbox;
pub mod message;

// State machine and its drivers (order matters for dependencies)
pub mod effect;
pub mod philosopher;
pub mod topology;
pub mod table;
pub mod runtime;
pub mod sim;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, PaceRange, TableConfig};
pub use effect::{Effect, Event};
pub use error::ProtocolError;
pub use events::{
    EventBus, EventFilter, EventLog, EventPattern, EventReceiver, EventRecord, SubscriberId,
};
pub use fork::{AgentId, Fork, ForkKey};
pub use mailbox::{Directory, Mailbox, MailboxSender};
pub use message::{Message, MessageKind};
pub use philosopher::{Phase, Philosopher, PhilosopherInput};
pub use runtime::{
    AgentReport, Runtime, RuntimeConfig, RuntimeError, ShutdownReport, TableHandle, TableStatus,
};
pub use sim::{Simulation, SimulationError, StepOutcome};
pub use table::{Table, TableError};
pub use topology::{Topology, TopologyError, TopologyKind};
