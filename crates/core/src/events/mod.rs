// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events system for observing a running table
//!
//! This module provides:
//! - `EventBus` - Fan protocol events out to filtered subscribers
//! - `EventFilter` - Select events by name pattern and acting agent
//! - `EventLog` - Append-only JSONL audit trail of events

mod bus;
mod filter;
mod log;

pub use bus::{EventBus, EventReceiver, EventSender, SubscriberId};
pub use filter::{EventFilter, EventPattern};
pub use log::{EventLog, EventRecord};
