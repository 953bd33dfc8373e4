// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent inbound message channels
//!
//! Any neighbor may write to a mailbox; only the owning agent reads it.
//! Messages from one sender arrive in send order. Nothing is ordered across
//! different senders.

use crate::error::ProtocolError;
use crate::fork::AgentId;
use crate::message::Message;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Write side of a mailbox, cheap to clone into every neighbor
#[derive(Clone, Debug)]
pub struct MailboxSender {
    owner: AgentId,
    tx: mpsc::UnboundedSender<Message>,
}

impl MailboxSender {
    /// Append a message. Fails only if the owning agent dropped its mailbox.
    pub fn send(&self, message: Message) -> Result<(), ProtocolError> {
        self.tx
            .send(message)
            .map_err(|_| ProtocolError::MailboxClosed(self.owner))
    }
}

/// Read side of a mailbox, held by the owning agent only
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Mailbox {
    /// Create a mailbox for `owner`
    pub fn channel(owner: AgentId) -> (MailboxSender, Mailbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MailboxSender { owner, tx }, Mailbox { rx })
    }

    /// Wait for the next message.
    ///
    /// Returns `None` once every sender is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Pop every queued message, oldest first
    pub fn drain_all(&mut self) -> Vec<Message> {
        let mut drained = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            drained.push(message);
        }
        drained
    }
}

/// Address book of every mailbox at the table, indexed by agent id
#[derive(Clone, Debug)]
pub struct Directory {
    senders: Arc<[MailboxSender]>,
}

impl Directory {
    /// Build from senders ordered by agent id
    pub fn new(senders: Vec<MailboxSender>) -> Self {
        Self {
            senders: senders.into(),
        }
    }

    /// One mailbox per agent `0..agents`, with the directory addressing them
    pub fn for_agents(agents: u32) -> (Directory, Vec<Mailbox>) {
        let (senders, mailboxes): (Vec<MailboxSender>, Vec<Mailbox>) =
            (0..agents).map(|i| Mailbox::channel(AgentId(i))).unzip();
        (Directory::new(senders), mailboxes)
    }

    pub fn send(&self, to: AgentId, message: Message) -> Result<(), ProtocolError> {
        self.senders
            .get(to.index())
            .ok_or(ProtocolError::UnknownAgent(to))?
            .send(message)
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
