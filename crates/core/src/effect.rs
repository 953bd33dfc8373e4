// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events for state machine orchestration

use crate::fork::{AgentId, ForkKey};
use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Effects are side effects the philosopher state machine requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Put a message into a neighbor's mailbox
    Send { to: AgentId, message: Message },
    /// Emit an event for observers
    Emit(Event),
}

/// Observable protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// `agent` asked `from` for `fork`
    Requested {
        agent: AgentId,
        fork: ForkKey,
        from: AgentId,
    },
    /// `from` handed `fork` to `to`
    Granted {
        from: AgentId,
        to: AgentId,
        fork: ForkKey,
    },
    /// `agent` holds a clean `fork` and put `requester` on hold
    Deferred {
        agent: AgentId,
        requester: AgentId,
        fork: ForkKey,
    },
    AcquiredAll {
        agent: AgentId,
    },
    Eating {
        agent: AgentId,
    },
    Released {
        agent: AgentId,
        meals: u64,
    },
    /// `agent` has been hungry longer than the starvation threshold
    Starving {
        agent: AgentId,
        waited_ms: u64,
    },
    Stopped {
        agent: AgentId,
        meals: u64,
    },
}

impl Event {
    /// Event name for pattern matching, formatted "category:action"
    pub fn name(&self) -> &'static str {
        match self {
            Event::Requested { .. } => "fork:requested",
            Event::Granted { .. } => "fork:granted",
            Event::Deferred { .. } => "fork:deferred",
            Event::AcquiredAll { .. } => "agent:acquired",
            Event::Eating { .. } => "agent:eating",
            Event::Released { .. } => "agent:released",
            Event::Starving { .. } => "agent:starving",
            Event::Stopped { .. } => "agent:stopped",
        }
    }

    /// The agent whose state machine produced this event
    pub fn agent(&self) -> AgentId {
        match self {
            Event::Requested { agent, .. }
            | Event::Deferred { agent, .. }
            | Event::AcquiredAll { agent }
            | Event::Eating { agent }
            | Event::Released { agent, .. }
            | Event::Starving { agent, .. }
            | Event::Stopped { agent, .. } => *agent,
            Event::Granted { from, .. } => *from,
        }
    }

    /// Record the event through `tracing`
    pub fn trace(&self) {
        match self {
            Event::Requested { agent, fork, from } => {
                tracing::debug!(agent = %agent, fork = %fork, from = %from, "requested fork")
            }
            Event::Granted { from, to, fork } => {
                tracing::debug!(from = %from, to = %to, fork = %fork, "granted fork")
            }
            Event::Deferred {
                agent,
                requester,
                fork,
            } => {
                tracing::debug!(agent = %agent, requester = %requester, fork = %fork, "deferred request for clean fork")
            }
            Event::AcquiredAll { agent } => tracing::debug!(agent = %agent, "acquired all forks"),
            Event::Eating { agent } => tracing::debug!(agent = %agent, "eating"),
            Event::Released { agent, meals } => {
                tracing::debug!(agent = %agent, meals, "released forks")
            }
            Event::Starving { agent, waited_ms } => {
                tracing::warn!(agent = %agent, waited_ms, "hungry past starvation threshold")
            }
            Event::Stopped { agent, meals } => tracing::info!(agent = %agent, meals, "stopped"),
        }
    }
}

/// Split effects into outgoing messages and events, preserving order within each
pub fn partition(effects: Vec<Effect>) -> (Vec<(AgentId, Message)>, Vec<Event>) {
    let mut sends = Vec::new();
    let mut events = Vec::new();
    for effect in effects {
        match effect {
            Effect::Send { to, message } => sends.push((to, message)),
            Effect::Emit(event) => events.push(event),
        }
    }
    (sends, events)
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
