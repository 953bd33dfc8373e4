// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Who sits next to whom
//!
//! The topology is a read-only adjacency table built once at setup.
//! Philosophers refer to neighbors by id into this table, never by
//! reference to each other.

use crate::fork::{AgentId, ForkKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("a table needs at least 2 agents, got {0}")]
    TooFewAgents(u32),
    #[error("edge ({0},{0}) would give agent {0} a fork with itself")]
    SelfLoop(AgentId),
    #[error("agent {agent} is out of range for a table of {agents}")]
    OutOfRange { agent: AgentId, agents: u32 },
    #[error("fork {0} is listed twice")]
    DuplicateEdge(ForkKey),
    #[error("agent {0} has no neighbors")]
    Isolated(AgentId),
}

/// Shape of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    /// Agent i sits between i-1 and i+1 (mod n)
    #[default]
    Ring,
    /// Every agent shares a fork with every other agent
    Complete,
}

impl std::str::FromStr for TopologyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ring" => Ok(TopologyKind::Ring),
            "complete" => Ok(TopologyKind::Complete),
            other => Err(format!("unknown topology '{}', expected ring or complete", other)),
        }
    }
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyKind::Ring => write!(f, "ring"),
            TopologyKind::Complete => write!(f, "complete"),
        }
    }
}

/// Read-only adjacency table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    agents: u32,
    neighbors: Vec<Vec<AgentId>>,
    forks: Vec<ForkKey>,
}

impl Topology {
    pub fn build(kind: TopologyKind, agents: u32) -> Result<Self, TopologyError> {
        match kind {
            TopologyKind::Ring => Self::ring(agents),
            TopologyKind::Complete => Self::complete(agents),
        }
    }

    /// Ring of `agents`. Two agents share a single fork.
    pub fn ring(agents: u32) -> Result<Self, TopologyError> {
        if agents < 2 {
            return Err(TopologyError::TooFewAgents(agents));
        }
        let edges: BTreeSet<(u32, u32)> = (0..agents)
            .map(|i| {
                let next = (i + 1) % agents;
                (i.min(next), i.max(next))
            })
            .collect();
        Self::from_edges(agents, edges)
    }

    /// Every pair of agents shares a fork
    pub fn complete(agents: u32) -> Result<Self, TopologyError> {
        if agents < 2 {
            return Err(TopologyError::TooFewAgents(agents));
        }
        let edges = (0..agents).flat_map(|a| ((a + 1)..agents).map(move |b| (a, b)));
        Self::from_edges(agents, edges)
    }

    /// Arbitrary topology from an edge list
    pub fn from_edges(
        agents: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> Result<Self, TopologyError> {
        if agents < 2 {
            return Err(TopologyError::TooFewAgents(agents));
        }

        let mut seen = BTreeSet::new();
        for (a, b) in edges {
            for agent in [a, b] {
                if agent >= agents {
                    return Err(TopologyError::OutOfRange {
                        agent: AgentId(agent),
                        agents,
                    });
                }
            }
            let key =
                ForkKey::new(AgentId(a), AgentId(b)).ok_or(TopologyError::SelfLoop(AgentId(a)))?;
            if !seen.insert(key) {
                return Err(TopologyError::DuplicateEdge(key));
            }
        }

        let mut neighbors = vec![Vec::new(); agents as usize];
        for key in &seen {
            neighbors[key.low().index()].push(key.high());
            neighbors[key.high().index()].push(key.low());
        }
        for (i, list) in neighbors.iter_mut().enumerate() {
            if list.is_empty() {
                return Err(TopologyError::Isolated(AgentId(i as u32)));
            }
            list.sort();
        }

        Ok(Self {
            agents,
            neighbors,
            forks: seen.into_iter().collect(),
        })
    }

    pub fn agent_count(&self) -> u32 {
        self.agents
    }

    pub fn fork_count(&self) -> usize {
        self.forks.len()
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentId> {
        (0..self.agents).map(AgentId)
    }

    /// Neighbors of `agent` in ascending id order, empty for unknown ids
    pub fn neighbors(&self, agent: AgentId) -> &[AgentId] {
        self.neighbors
            .get(agent.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every fork at the table, ordered
    pub fn forks(&self) -> &[ForkKey] {
        &self.forks
    }
}

#[cfg(test)]
#[path = "topology_tests.rs"]
mod tests;
