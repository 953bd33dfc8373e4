// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forks: the pairwise shared resources of the table
//!
//! A fork sits between exactly two neighboring philosophers. It always has a
//! single owner (one of its two endpoints) and a dirty bit that encodes who
//! has priority when the other endpoint asks for it.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a philosopher at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(id: u32) -> Self {
        AgentId(id)
    }
}

/// Unordered pair of agents naming the fork between them.
///
/// Always stored as `(low, high)` so that `ForkKey::new(a, b) == ForkKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawForkKey")]
pub struct ForkKey {
    low: AgentId,
    high: AgentId,
}

impl ForkKey {
    /// Build the key for the fork between `a` and `b`.
    ///
    /// Returns `None` when `a == b`; a fork needs two distinct endpoints.
    pub fn new(a: AgentId, b: AgentId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> AgentId {
        self.low
    }

    pub fn high(&self) -> AgentId {
        self.high
    }

    /// Whether `agent` is one of the two endpoints
    pub fn touches(&self, agent: AgentId) -> bool {
        self.low == agent || self.high == agent
    }

    /// The endpoint opposite to `agent`, if `agent` is an endpoint at all
    pub fn other(&self, agent: AgentId) -> Option<AgentId> {
        if agent == self.low {
            Some(self.high)
        } else if agent == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct RawForkKey {
    low: AgentId,
    high: AgentId,
}

impl TryFrom<RawForkKey> for ForkKey {
    type Error = String;

    fn try_from(raw: RawForkKey) -> Result<Self, Self::Error> {
        match ForkKey::new(raw.low, raw.high) {
            Some(key) if key.low == raw.low => Ok(key),
            Some(_) => Err(format!("fork key ({},{}) is not ordered", raw.low, raw.high)),
            None => Err(format!("fork key ({0},{0}) joins an agent to itself", raw.low)),
        }
    }
}

impl fmt::Display for ForkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.low, self.high)
    }
}

/// A fork and its ownership state.
///
/// Forks are values that move: the holder keeps the `Fork` in its own state
/// and hands it over by moving it into a grant message. Nobody else can
/// observe or mutate it in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFork")]
pub struct Fork {
    key: ForkKey,
    owner: AgentId,
    dirty: bool,
}

impl Fork {
    /// Create a fork at table setup: owned by the lower endpoint, dirty.
    pub fn new(key: ForkKey) -> Self {
        Self {
            key,
            owner: key.low(),
            dirty: true,
        }
    }

    /// Create a fork with an explicit initial owner and dirty bit.
    pub fn with_owner(key: ForkKey, owner: AgentId, dirty: bool) -> Result<Self, ProtocolError> {
        if !key.touches(owner) {
            return Err(ProtocolError::WrongEndpoint { fork: key, agent: owner });
        }
        Ok(Self { key, owner, dirty })
    }

    pub fn key(&self) -> ForkKey {
        self.key
    }

    pub fn owner(&self) -> AgentId {
        self.owner
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Hand the fork to `to`. The receiving side gets it clean.
    pub fn transfer(&mut self, to: AgentId) -> Result<(), ProtocolError> {
        if !self.key.touches(to) {
            return Err(ProtocolError::WrongEndpoint {
                fork: self.key,
                agent: to,
            });
        }
        self.owner = to;
        self.dirty = false;
        Ok(())
    }

    /// Called by the holder right after eating with it.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Wire form of a fork, checked on the way in
#[derive(Deserialize)]
struct RawFork {
    key: ForkKey,
    owner: AgentId,
    dirty: bool,
}

impl TryFrom<RawFork> for Fork {
    type Error = ProtocolError;

    fn try_from(raw: RawFork) -> Result<Self, Self::Error> {
        Fork::with_owner(raw.key, raw.owner, raw.dirty)
    }
}

#[cfg(test)]
#[path = "fork_tests.rs"]
mod tests;
