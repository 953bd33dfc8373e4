// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic single-threaded simulation
//!
//! Drives the same philosopher state machines as the live runtime, but with
//! every message parked in an explicit per-channel FIFO queue. One step moves
//! one agent by one atomic action, so the global invariants can be checked
//! between any two steps.

use crate::clock::FakeClock;
use crate::effect::{Effect, Event};
use crate::error::ProtocolError;
use crate::fork::{AgentId, ForkKey};
use crate::message::Message;
use crate::philosopher::{Phase, Philosopher, PhilosopherInput};
use crate::table::Table;
use crate::topology::Topology;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("no agent {0} at this table")]
    UnknownAgent(AgentId),
    #[error("invariant violated after step {step}: {reason}")]
    InvariantViolated { step: u64, reason: String },
}

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Delivered,
    BecameHungry,
    FinishedEating,
    /// Nothing to do: waiting for forks, sated, or stopped
    Idle,
}

pub struct Simulation {
    topology: Arc<Topology>,
    philosophers: Vec<Philosopher>,
    /// In-flight messages keyed by (from, to)
    channels: BTreeMap<(AgentId, AgentId), VecDeque<Message>>,
    /// Round-robin position over each agent's neighbors
    cursors: Vec<usize>,
    clock: FakeClock,
    events: Vec<Event>,
    steps: u64,
    meal_limit: Option<u64>,
}

impl Simulation {
    pub fn new(table: Table) -> Self {
        let (topology, philosophers) = table.into_parts();
        let cursors = vec![0; philosophers.len()];
        Self {
            topology,
            philosophers,
            channels: BTreeMap::new(),
            cursors,
            clock: FakeClock::new(),
            events: Vec::new(),
            steps: 0,
            meal_limit: None,
        }
    }

    /// Agents that have eaten `limit` times stop getting hungry
    pub fn with_meal_limit(mut self, limit: u64) -> Self {
        self.meal_limit = Some(limit);
        self
    }

    pub fn philosophers(&self) -> &[Philosopher] {
        &self.philosophers
    }

    pub fn meals(&self) -> Vec<u64> {
        self.philosophers.iter().map(|p| p.meals()).collect()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Messages sent but not yet delivered
    pub fn in_flight(&self) -> usize {
        self.channels.values().map(VecDeque::len).sum()
    }

    /// Whether every agent has reached the meal limit
    pub fn is_sated(&self) -> bool {
        match self.meal_limit {
            Some(limit) => self.philosophers.iter().all(|p| p.meals() >= limit),
            None => false,
        }
    }

    /// Move `agent` by one action.
    ///
    /// Pending mail comes first, taken round-robin across its neighbors.
    /// Otherwise a thinking agent gets hungry and an eating agent finishes.
    pub fn step(&mut self, agent: AgentId) -> Result<StepOutcome, SimulationError> {
        let (phase, meals) = self
            .philosophers
            .get(agent.index())
            .map(|p| (p.phase(), p.meals()))
            .ok_or(SimulationError::UnknownAgent(agent))?;
        self.steps += 1;

        if let Some(message) = self.next_message(agent) {
            self.apply(agent, PhilosopherInput::Deliver(message))?;
            return Ok(StepOutcome::Delivered);
        }

        match phase {
            Phase::Thinking => {
                if self.meal_limit.is_some_and(|limit| meals >= limit) {
                    return Ok(StepOutcome::Idle);
                }
                self.apply(agent, PhilosopherInput::Hungry)?;
                Ok(StepOutcome::BecameHungry)
            }
            Phase::Eating => {
                self.apply(agent, PhilosopherInput::DoneEating)?;
                Ok(StepOutcome::FinishedEating)
            }
            Phase::Requesting | Phase::Stopped => Ok(StepOutcome::Idle),
        }
    }

    /// Step agents in the given order, checking invariants after each step
    pub fn run(
        &mut self,
        schedule: impl IntoIterator<Item = AgentId>,
    ) -> Result<(), SimulationError> {
        for agent in schedule {
            self.step(agent)?;
            self.check_invariants()?;
        }
        Ok(())
    }

    /// Visit every agent in id order, `rounds` times
    pub fn run_round_robin(&mut self, rounds: u64) -> Result<(), SimulationError> {
        let agents: Vec<AgentId> = self.topology.agents().collect();
        for _ in 0..rounds {
            self.run(agents.iter().copied())?;
        }
        Ok(())
    }

    /// Step uniformly random agents from a seeded generator
    pub fn run_random(&mut self, steps: u64, seed: u64) -> Result<(), SimulationError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let agents = self.topology.agent_count();
        for _ in 0..steps {
            if self.is_sated() {
                break;
            }
            let agent = AgentId(rng.random_range(0..agents));
            self.step(agent)?;
            self.check_invariants()?;
        }
        Ok(())
    }

    /// Stop every agent and deliver what is still in flight.
    ///
    /// Afterwards no message is pending and every fork sits with an endpoint.
    pub fn stop_all(&mut self) -> Result<(), SimulationError> {
        let agents: Vec<AgentId> = self.topology.agents().collect();
        for agent in &agents {
            self.apply(*agent, PhilosopherInput::Stop)?;
        }
        while self.in_flight() > 0 {
            for agent in &agents {
                while let Some(message) = self.next_message(*agent) {
                    self.apply(*agent, PhilosopherInput::Deliver(message))?;
                }
            }
        }
        self.check_invariants()
    }

    /// Check ownership conservation and mutual exclusion
    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        let mut holders: BTreeMap<ForkKey, Vec<AgentId>> = BTreeMap::new();

        for philosopher in &self.philosophers {
            for fork in philosopher.owned() {
                if fork.owner() != philosopher.id() {
                    return self.violation(format!(
                        "agent {} holds fork {} that names {} as owner",
                        philosopher.id(),
                        fork.key(),
                        fork.owner()
                    ));
                }
                holders.entry(fork.key()).or_default().push(philosopher.id());
            }
        }
        for ((_, to), queue) in &self.channels {
            for message in queue.iter().filter(|m| m.is_grant()) {
                holders.entry(message.fork()).or_default().push(*to);
            }
        }

        for key in self.topology.forks() {
            match holders.get(key).map(Vec::as_slice) {
                Some([holder]) if key.touches(*holder) => {}
                Some([holder]) => {
                    return self.violation(format!("fork {} held by non-endpoint {}", key, holder))
                }
                Some(many) if many.len() > 1 => {
                    return self.violation(format!("fork {} held by {:?}", key, many))
                }
                _ => return self.violation(format!("fork {} has no holder", key)),
            }
        }
        if holders.len() != self.topology.fork_count() {
            return self.violation("a fork outside the topology is in play".to_string());
        }

        for philosopher in self.philosophers.iter().filter(|p| p.is_eating()) {
            if !philosopher.has_all_forks() {
                return self.violation(format!(
                    "agent {} eats without all of its forks",
                    philosopher.id()
                ));
            }
            for neighbor in philosopher.neighbors() {
                let neighbor_eating = self
                    .philosophers
                    .get(neighbor.index())
                    .is_some_and(Philosopher::is_eating);
                if neighbor_eating {
                    return self.violation(format!(
                        "neighbors {} and {} eat at the same time",
                        philosopher.id(),
                        neighbor
                    ));
                }
            }
        }

        Ok(())
    }

    fn violation(&self, reason: String) -> Result<(), SimulationError> {
        Err(SimulationError::InvariantViolated {
            step: self.steps,
            reason,
        })
    }

    fn next_message(&mut self, agent: AgentId) -> Option<Message> {
        let neighbors = self.topology.neighbors(agent);
        if neighbors.is_empty() {
            return None;
        }
        let start = self.cursors[agent.index()];
        for offset in 0..neighbors.len() {
            let slot = (start + offset) % neighbors.len();
            let from = neighbors[slot];
            if let Some(message) = self
                .channels
                .get_mut(&(from, agent))
                .and_then(VecDeque::pop_front)
            {
                self.cursors[agent.index()] = (slot + 1) % neighbors.len();
                return Some(message);
            }
        }
        None
    }

    fn apply(&mut self, agent: AgentId, input: PhilosopherInput) -> Result<(), SimulationError> {
        let current = self
            .philosophers
            .get(agent.index())
            .ok_or(SimulationError::UnknownAgent(agent))?;
        let (next, effects) = current.transition(input, &self.clock)?;
        self.philosophers[agent.index()] = next;

        for effect in effects {
            match effect {
                Effect::Send { to, message } => {
                    self.channels
                        .entry((agent, to))
                        .or_default()
                        .push_back(message);
                }
                Effect::Emit(event) => self.events.push(event),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "sim_tests.rs"]
mod tests;
