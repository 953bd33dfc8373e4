// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messages exchanged between neighboring philosophers

use crate::fork::{AgentId, Fork, ForkKey};
use serde::{Deserialize, Serialize};

/// What a message asks for or carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Please hand me this fork
    Request,
    /// Here it is. The fork value travels with the message.
    Grant(Fork),
}

/// An immutable notification from one neighbor to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    sender: AgentId,
    fork: ForkKey,
    kind: MessageKind,
}

impl Message {
    pub fn request(sender: AgentId, fork: ForkKey) -> Self {
        Self {
            sender,
            fork,
            kind: MessageKind::Request,
        }
    }

    pub fn grant(sender: AgentId, fork: Fork) -> Self {
        Self {
            sender,
            fork: fork.key(),
            kind: MessageKind::Grant(fork),
        }
    }

    pub fn sender(&self) -> AgentId {
        self.sender
    }

    pub fn fork(&self) -> ForkKey {
        self.fork
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn is_grant(&self) -> bool {
        matches!(self.kind, MessageKind::Grant(_))
    }

    /// Take the message apart, moving the carried fork out of a grant
    pub fn into_parts(self) -> (AgentId, ForkKey, MessageKind) {
        (self.sender, self.fork, self.kind)
    }
}
