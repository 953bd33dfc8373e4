// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table bootstrap
//!
//! Turns a topology into seated philosophers: one fork per neighbor pair,
//! initially held dirty by the lower-numbered endpoint. That assignment makes
//! the precedence graph acyclic, which is what keeps the table out of deadlock
//! from the very first round.

use crate::error::ProtocolError;
use crate::fork::{AgentId, Fork, ForkKey};
use crate::philosopher::Philosopher;
use crate::topology::{Topology, TopologyError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("fork {0} has no initial owner")]
    MissingFork(ForkKey),
    #[error("fork {0} is not part of the topology")]
    UnknownFork(ForkKey),
    #[error("fork {0} was given more than one initial owner")]
    DuplicateFork(ForkKey),
}

/// A seated table, ready to be driven by the runtime or the simulation
#[derive(Debug, Clone)]
pub struct Table {
    topology: Arc<Topology>,
    philosophers: Vec<Philosopher>,
}

impl Table {
    /// Seat everyone with the default lower-id-owns assignment
    pub fn new(topology: Topology, starvation_threshold: Duration) -> Result<Self, TableError> {
        let forks = topology.forks().iter().map(|key| Fork::new(*key)).collect();
        Self::from_forks(topology, starvation_threshold, forks)
    }

    /// Seat everyone with explicit initial fork states.
    ///
    /// Every topology fork must appear exactly once.
    pub fn from_forks(
        topology: Topology,
        starvation_threshold: Duration,
        forks: Vec<Fork>,
    ) -> Result<Self, TableError> {
        let mut by_key = BTreeMap::new();
        for fork in forks {
            let key = fork.key();
            if !topology.forks().contains(&key) {
                return Err(TableError::UnknownFork(key));
            }
            if by_key.insert(key, fork).is_some() {
                return Err(TableError::DuplicateFork(key));
            }
        }
        if let Some(missing) = topology.forks().iter().find(|k| !by_key.contains_key(*k)) {
            return Err(TableError::MissingFork(*missing));
        }

        let mut holdings: Vec<Vec<Fork>> = vec![Vec::new(); topology.agent_count() as usize];
        for fork in by_key.into_values() {
            let owner = fork.owner();
            match holdings.get_mut(owner.index()) {
                Some(held) => held.push(fork),
                None => {
                    return Err(ProtocolError::WrongEndpoint {
                        fork: fork.key(),
                        agent: owner,
                    }
                    .into())
                }
            }
        }

        let philosophers = topology
            .agents()
            .zip(holdings)
            .map(|(id, forks)| {
                Philosopher::new(
                    id,
                    topology.neighbors(id).to_vec(),
                    forks,
                    starvation_threshold,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            agents = topology.agent_count(),
            forks = topology.fork_count(),
            "table seated"
        );

        Ok(Self {
            topology: Arc::new(topology),
            philosophers,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn philosophers(&self) -> &[Philosopher] {
        &self.philosophers
    }

    pub fn philosopher(&self, id: AgentId) -> Option<&Philosopher> {
        self.philosophers.get(id.index())
    }

    pub fn into_parts(self) -> (Arc<Topology>, Vec<Philosopher>) {
        (self.topology, self.philosophers)
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
