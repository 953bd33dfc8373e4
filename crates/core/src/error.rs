// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol violations
//!
//! Every variant means a broken table invariant, not a transient condition.
//! Delivery is in-process and reliable, so none of these are retried.

use crate::fork::{AgentId, ForkKey};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("agent {agent} got a message about fork {fork}, which is not adjacent to it")]
    NotAdjacent { agent: AgentId, fork: ForkKey },
    #[error("agent {agent} is not an endpoint of fork {fork}")]
    WrongEndpoint { fork: ForkKey, agent: AgentId },
    #[error("agent {agent} was asked for fork {fork} by {requester} but does not hold it")]
    NotOwned {
        agent: AgentId,
        requester: AgentId,
        fork: ForkKey,
    },
    #[error("agent {agent} was granted fork {fork} by {sender} but already holds it")]
    DoubleGrant {
        agent: AgentId,
        sender: AgentId,
        fork: ForkKey,
    },
    #[error("agent {agent} received fork {fork} that is not addressed to it")]
    ForeignFork { agent: AgentId, fork: ForkKey },
    #[error("no mailbox for agent {0}")]
    UnknownAgent(AgentId),
    #[error("mailbox of agent {0} is closed, message lost")]
    MailboxClosed(AgentId),
}

impl ProtocolError {
    /// Violations a live agent can log and step over.
    ///
    /// A request for a fork the agent does not hold can only come from a
    /// bootstrap or transport bug; the fork itself is still accounted for.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProtocolError::NotOwned { .. })
    }
}
