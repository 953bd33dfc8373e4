// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Philosopher state machine
//!
//! A philosopher cycles THINKING → REQUESTING → EATING → (release) → THINKING.
//! It owns some of its adjacent forks, asks neighbors for the missing ones and
//! answers their requests according to the dirty bit:
//!
//! - a dirty fork is surrendered on request (unless the holder is eating),
//! - a clean fork is kept, and the request deferred, until the holder has
//!   eaten with it once.
//!
//! The transition function is pure: it returns the next state together with
//! the messages to send and the events to emit. Drivers (the async runtime or
//! the deterministic simulation) execute those effects.

use crate::clock::{millis, Clock};
use crate::effect::{Effect, Event};
use crate::error::ProtocolError;
use crate::fork::{AgentId, Fork, ForkKey};
use crate::message::{Message, MessageKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

/// Where a philosopher is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Thinking,
    Requesting,
    Eating,
    /// Left the table; answers every request with a grant
    Stopped,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Thinking => "thinking",
            Phase::Requesting => "requesting",
            Phase::Eating => "eating",
            Phase::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

/// Inputs that drive the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhilosopherInput {
    /// Done thinking, start asking for forks
    Hungry,
    /// A message from a neighbor's mailbox
    Deliver(Message),
    /// Critical section finished; release and flush deferred requests
    DoneEating,
    /// Periodic check for starvation while requesting
    Tick,
    /// Leave the table, handing over everything that is owed
    Stop,
}

#[derive(Debug, Clone)]
pub struct Philosopher {
    id: AgentId,
    neighbors: Vec<AgentId>,
    phase: Phase,
    owned: BTreeMap<ForkKey, Fork>,
    requested: BTreeSet<ForkKey>,
    deferred: BTreeSet<(AgentId, ForkKey)>,
    meals: u64,
    starvation_threshold: Duration,
    hungry_since: Option<Instant>,
    starving_reported: bool,
}

impl Philosopher {
    /// Seat a philosopher with its neighbors and the forks it starts with.
    ///
    /// Every initial fork must be adjacent (its other endpoint is a neighbor)
    /// and already list this philosopher as owner.
    pub fn new(
        id: AgentId,
        neighbors: Vec<AgentId>,
        forks: Vec<Fork>,
        starvation_threshold: Duration,
    ) -> Result<Self, ProtocolError> {
        let mut owned = BTreeMap::new();
        for fork in forks {
            let key = fork.key();
            match key.other(id) {
                Some(other) if neighbors.contains(&other) => {}
                _ => return Err(ProtocolError::NotAdjacent { agent: id, fork: key }),
            }
            if fork.owner() != id {
                return Err(ProtocolError::ForeignFork { agent: id, fork: key });
            }
            owned.insert(key, fork);
        }

        Ok(Self {
            id,
            neighbors,
            phase: Phase::Thinking,
            owned,
            requested: BTreeSet::new(),
            deferred: BTreeSet::new(),
            meals: 0,
            starvation_threshold,
            hungry_since: None,
            starving_reported: false,
        })
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn meals(&self) -> u64 {
        self.meals
    }

    pub fn neighbors(&self) -> &[AgentId] {
        &self.neighbors
    }

    pub fn is_eating(&self) -> bool {
        self.phase == Phase::Eating
    }

    pub fn owns(&self, fork: ForkKey) -> bool {
        self.owned.contains_key(&fork)
    }

    pub fn fork(&self, key: ForkKey) -> Option<&Fork> {
        self.owned.get(&key)
    }

    pub fn owned(&self) -> impl Iterator<Item = &Fork> {
        self.owned.values()
    }

    pub fn owned_count(&self) -> usize {
        self.owned.len()
    }

    pub fn requested(&self) -> &BTreeSet<ForkKey> {
        &self.requested
    }

    pub fn deferred(&self) -> &BTreeSet<(AgentId, ForkKey)> {
        &self.deferred
    }

    /// Every fork this philosopher needs in order to eat
    pub fn needed_forks(&self) -> Vec<ForkKey> {
        self.neighbors
            .iter()
            .filter_map(|n| ForkKey::new(self.id, *n))
            .collect()
    }

    pub fn has_all_forks(&self) -> bool {
        self.needed_forks().iter().all(|key| self.owned.contains_key(key))
    }

    /// Pure transition function - returns the next state and its effects.
    ///
    /// On error the philosopher is left untouched; the caller decides whether
    /// the violation is fatal.
    pub fn transition(
        &self,
        input: PhilosopherInput,
        clock: &impl Clock,
    ) -> Result<(Philosopher, Vec<Effect>), ProtocolError> {
        let mut next = self.clone();
        let mut effects = Vec::new();

        match input {
            PhilosopherInput::Hungry => {
                if self.phase == Phase::Thinking {
                    next.start_requesting(clock.now(), &mut effects);
                }
            }
            PhilosopherInput::Deliver(message) => {
                next.deliver(message, &mut effects)?;
            }
            PhilosopherInput::DoneEating => {
                if self.phase == Phase::Eating {
                    next.release(&mut effects)?;
                    next.meals += 1;
                    next.phase = Phase::Thinking;
                    effects.push(Effect::Emit(Event::Released {
                        agent: self.id,
                        meals: next.meals,
                    }));
                }
            }
            PhilosopherInput::Tick => {
                if let (Phase::Requesting, Some(since)) = (self.phase, self.hungry_since) {
                    let waited = clock.elapsed_since(since);
                    if !self.starving_reported && waited > self.starvation_threshold {
                        next.starving_reported = true;
                        effects.push(Effect::Emit(Event::Starving {
                            agent: self.id,
                            waited_ms: millis(waited),
                        }));
                    }
                }
            }
            PhilosopherInput::Stop => {
                if self.phase != Phase::Stopped {
                    if self.phase == Phase::Eating {
                        next.meals += 1;
                    }
                    next.release(&mut effects)?;
                    next.phase = Phase::Stopped;
                    next.requested.clear();
                    next.hungry_since = None;
                    effects.push(Effect::Emit(Event::Stopped {
                        agent: self.id,
                        meals: next.meals,
                    }));
                }
            }
        }

        Ok((next, effects))
    }

    fn start_requesting(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.phase = Phase::Requesting;
        self.hungry_since = Some(now);
        self.starving_reported = false;

        for key in self.needed_forks() {
            if !self.owned.contains_key(&key) {
                self.request(key, effects);
            }
        }
        self.eat_if_ready(effects);
    }

    fn request(&mut self, key: ForkKey, effects: &mut Vec<Effect>) {
        let Some(holder) = key.other(self.id) else {
            return;
        };
        if !self.requested.insert(key) {
            return;
        }
        effects.push(Effect::Send {
            to: holder,
            message: Message::request(self.id, key),
        });
        effects.push(Effect::Emit(Event::Requested {
            agent: self.id,
            fork: key,
            from: holder,
        }));
    }

    fn eat_if_ready(&mut self, effects: &mut Vec<Effect>) {
        if self.phase == Phase::Requesting && self.has_all_forks() {
            self.phase = Phase::Eating;
            self.hungry_since = None;
            effects.push(Effect::Emit(Event::AcquiredAll { agent: self.id }));
            effects.push(Effect::Emit(Event::Eating { agent: self.id }));
        }
    }

    /// Check that `sender` is the opposite endpoint of adjacent fork `key`
    fn check_endpoint(&self, sender: AgentId, key: ForkKey) -> Result<(), ProtocolError> {
        let Some(other) = key.other(self.id) else {
            return Err(ProtocolError::NotAdjacent {
                agent: self.id,
                fork: key,
            });
        };
        if !self.neighbors.contains(&other) {
            return Err(ProtocolError::NotAdjacent {
                agent: self.id,
                fork: key,
            });
        }
        if other != sender {
            return Err(ProtocolError::WrongEndpoint {
                fork: key,
                agent: sender,
            });
        }
        Ok(())
    }

    fn deliver(&mut self, message: Message, effects: &mut Vec<Effect>) -> Result<(), ProtocolError> {
        let (sender, key, kind) = message.into_parts();
        self.check_endpoint(sender, key)?;

        match kind {
            MessageKind::Request => {
                let Some(fork) = self.owned.get(&key) else {
                    return Err(ProtocolError::NotOwned {
                        agent: self.id,
                        requester: sender,
                        fork: key,
                    });
                };

                let must_yield = match self.phase {
                    Phase::Eating => false,
                    Phase::Stopped => true,
                    Phase::Thinking | Phase::Requesting => fork.is_dirty(),
                };

                if must_yield {
                    self.grant(sender, key, effects)?;
                    // A hungry philosopher that gives up a dirty fork asks for it back
                    if self.phase == Phase::Requesting {
                        self.request(key, effects);
                    }
                } else if self.deferred.insert((sender, key)) {
                    effects.push(Effect::Emit(Event::Deferred {
                        agent: self.id,
                        requester: sender,
                        fork: key,
                    }));
                }
            }
            MessageKind::Grant(fork) => {
                if fork.key() != key || fork.owner() != self.id {
                    return Err(ProtocolError::ForeignFork {
                        agent: self.id,
                        fork: key,
                    });
                }
                if self.owned.contains_key(&key) {
                    return Err(ProtocolError::DoubleGrant {
                        agent: self.id,
                        sender,
                        fork: key,
                    });
                }
                self.owned.insert(key, fork);
                self.requested.remove(&key);
                self.eat_if_ready(effects);
            }
        }

        Ok(())
    }

    fn grant(&mut self, to: AgentId, key: ForkKey, effects: &mut Vec<Effect>) -> Result<(), ProtocolError> {
        let Some(mut fork) = self.owned.remove(&key) else {
            return Ok(());
        };
        if let Err(e) = fork.transfer(to) {
            self.owned.insert(key, fork);
            return Err(e);
        }
        effects.push(Effect::Send {
            to,
            message: Message::grant(self.id, fork),
        });
        effects.push(Effect::Emit(Event::Granted {
            from: self.id,
            to,
            fork: key,
        }));
        Ok(())
    }

    /// Mark everything dirty and hand over every deferred fork
    fn release(&mut self, effects: &mut Vec<Effect>) -> Result<(), ProtocolError> {
        for fork in self.owned.values_mut() {
            fork.mark_dirty();
        }
        let deferred = std::mem::take(&mut self.deferred);
        for (requester, key) in deferred {
            if self.owned.contains_key(&key) {
                self.grant(requester, key, effects)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "philosopher_tests.rs"]
mod tests;
