// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of protocol events to filtered subscribers

use super::filter::EventFilter;
use crate::effect::Event;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

/// Sender for event delivery
pub type EventSender = mpsc::UnboundedSender<Event>;
/// Receiver for event delivery
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscriber {
    id: SubscriberId,
    filter: EventFilter,
    tx: EventSender,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Shared by every agent of a table; clones publish to the same subscribers.
///
/// Publishing never waits on a subscriber. Each one reads from its own
/// unbounded channel, and subscribers whose receiver is gone are pruned on
/// the next publish.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event that passes `filter` from now on.
    ///
    /// The stream ends once the subscriber is removed and the queued events
    /// have been read.
    pub fn subscribe(&self, filter: EventFilter) -> (SubscriberId, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.write();
        let id = SubscriberId(registry.next_id);
        registry.next_id += 1;
        tracing::debug!(subscriber = %id, filter = %filter, "subscribed");
        registry.subscribers.push(Subscriber { id, filter, tx });
        (id, rx)
    }

    /// Remove a subscriber, closing its stream. False if it was not present.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut registry = self.write();
        let before = registry.subscribers.len();
        registry.subscribers.retain(|s| s.id != id);
        registry.subscribers.len() < before
    }

    pub fn publish(&self, event: Event) {
        let mut closed = false;
        for subscriber in self.read().subscribers.iter() {
            if subscriber.filter.matches(&event) && subscriber.tx.send(event.clone()).is_err() {
                closed = true;
            }
        }
        if closed {
            self.write().subscribers.retain(|s| !s.tx.is_closed());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().subscribers.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
