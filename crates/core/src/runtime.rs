// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live runtime: one tokio task per philosopher
//!
//! Each task owns its philosopher and its mailbox outright. The only things
//! shared between tasks are mailbox senders, the event bus and the shutdown
//! signal. Forks move between tasks inside grant messages.

use crate::clock::{millis, Clock};
use crate::config::PaceRange;
use crate::effect::{self, Event};
use crate::error::ProtocolError;
use crate::events::EventBus;
use crate::fork::{AgentId, ForkKey};
use crate::mailbox::{Directory, Mailbox};
use crate::message::{Message, MessageKind};
use crate::philosopher::{Phase, Philosopher, PhilosopherInput};
use crate::table::Table;
use crate::topology::Topology;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("agent {agent} stopped on a protocol violation: {source}")]
    Agent {
        agent: AgentId,
        #[source]
        source: ProtocolError,
    },
    #[error("agent {agent} task did not finish: {message}")]
    Join { agent: AgentId, message: String },
    #[error("fork audit failed for {fork}: {reason}")]
    Audit { fork: ForkKey, reason: String },
}

/// Pacing and limits for a live table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub think: PaceRange,
    pub eat: PaceRange,
    pub tick_interval: Duration,
    pub meals_per_agent: Option<u64>,
    /// Seed for pacing; agents draw from the OS generator when unset
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            think: PaceRange::new(Duration::from_millis(100), Duration::from_millis(300)),
            eat: PaceRange::new(Duration::from_millis(100), Duration::from_millis(300)),
            tick_interval: Duration::from_secs(1),
            meals_per_agent: None,
            seed: None,
        }
    }
}

/// Status changes agents report back to the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// Every agent reached its meal limit
    Sated,
    /// An agent stopped on a protocol violation
    AgentFailed(AgentId),
}

#[derive(Debug, Clone, Copy)]
enum AgentStatus {
    Sated(AgentId),
    Failed(AgentId),
}

/// Final state of one agent after shutdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentReport {
    pub agent: AgentId,
    pub meals: u64,
    pub forks: Vec<ForkKey>,
}

/// What shutdown found after every agent stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub agents: Vec<AgentReport>,
    /// Grants that were still queued and got absorbed by their recipient
    pub absorbed_grants: usize,
    pub elapsed_ms: u64,
}

impl ShutdownReport {
    pub fn total_meals(&self) -> u64 {
        self.agents.iter().map(|a| a.meals).sum()
    }

    pub fn meals(&self) -> Vec<u64> {
        self.agents.iter().map(|a| a.meals).collect()
    }
}

pub struct Runtime;

impl Runtime {
    /// Start one task per philosopher. Must be called inside a tokio runtime.
    pub fn spawn<C>(table: Table, config: RuntimeConfig, bus: EventBus, clock: C) -> TableHandle
    where
        C: Clock + 'static,
    {
        Self::launch(table, config, bus, clock).0
    }

    /// Like `spawn`, also returning the table's mailbox directory
    fn launch<C>(
        table: Table,
        config: RuntimeConfig,
        bus: EventBus,
        clock: C,
    ) -> (TableHandle, Directory)
    where
        C: Clock + 'static,
    {
        let (topology, philosophers) = table.into_parts();
        let (directory, mailboxes) = Directory::for_agents(topology.agent_count());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        let tasks = philosophers
            .into_iter()
            .zip(mailboxes)
            .map(|(philosopher, mailbox)| {
                let id = philosopher.id();
                let rng = match config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(id.0))),
                    None => StdRng::from_os_rng(),
                };
                let agent = Agent {
                    philosopher,
                    mailbox,
                    directory: directory.clone(),
                    bus: bus.clone(),
                    clock: clock.clone(),
                    config: config.clone(),
                    rng,
                    shutdown: shutdown_rx.clone(),
                    status: status_tx.clone(),
                };
                (id, tokio::spawn(agent.run()))
            })
            .collect();

        tracing::info!(
            agents = topology.agent_count(),
            forks = topology.fork_count(),
            "table started"
        );

        let handle = TableHandle {
            topology,
            shutdown: shutdown_tx,
            tasks,
            status: status_rx,
            sated: 0,
            started: Instant::now(),
        };
        (handle, directory)
    }
}

/// Control handle for a running table
pub struct TableHandle {
    topology: Arc<Topology>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<(AgentId, JoinHandle<AgentExit>)>,
    status: mpsc::UnboundedReceiver<AgentStatus>,
    sated: u32,
    started: Instant,
}

impl TableHandle {
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Resolve once every agent is sated or any agent has failed.
    ///
    /// Never resolves for a table without a meal limit that runs cleanly.
    pub async fn wait(&mut self) -> TableStatus {
        while let Some(status) = self.status.recv().await {
            match status {
                AgentStatus::Sated(agent) => {
                    self.sated += 1;
                    tracing::debug!(agent = %agent, sated = self.sated, "agent sated");
                    if self.sated >= self.topology.agent_count() {
                        return TableStatus::Sated;
                    }
                }
                AgentStatus::Failed(agent) => return TableStatus::AgentFailed(agent),
            }
        }
        std::future::pending().await
    }

    /// Stop every agent, collect leftover grants and audit fork ownership
    pub async fn shutdown(self) -> Result<ShutdownReport, RuntimeError> {
        tracing::info!("shutting down table");
        let _ = self.shutdown.send(true);

        let mut exits = Vec::with_capacity(self.tasks.len());
        for (agent, task) in self.tasks {
            let exit = task.await.map_err(|e| RuntimeError::Join {
                agent,
                message: e.to_string(),
            })?;
            exits.push(exit);
        }

        let mut failure = None;
        let mut holders: BTreeMap<ForkKey, Vec<AgentId>> = BTreeMap::new();
        let mut absorbed_grants = 0;
        let mut agents = Vec::with_capacity(exits.len());

        for exit in exits {
            let AgentExit {
                philosopher,
                mut mailbox,
                failure: agent_failure,
            } = exit;
            let id = philosopher.id();
            if let Some(source) = agent_failure {
                if failure.is_none() {
                    failure = Some(RuntimeError::Agent { agent: id, source });
                }
            }

            let mut forks: Vec<ForkKey> = philosopher.owned().map(|f| f.key()).collect();
            for message in mailbox.drain_all() {
                let (sender, key, kind) = message.into_parts();
                if let MessageKind::Grant(fork) = kind {
                    tracing::debug!(agent = %id, from = %sender, fork = %key, "absorbing queued grant");
                    if fork.owner() != id {
                        return Err(RuntimeError::Audit {
                            fork: key,
                            reason: format!("queued for {} but owned by {}", id, fork.owner()),
                        });
                    }
                    absorbed_grants += 1;
                    forks.push(key);
                }
            }
            forks.sort();

            for key in &forks {
                holders.entry(*key).or_default().push(id);
            }
            agents.push(AgentReport {
                agent: id,
                meals: philosopher.meals(),
                forks,
            });
        }

        if let Some(failure) = failure {
            return Err(failure);
        }

        for key in self.topology.forks() {
            match holders.get(key).map(Vec::as_slice) {
                Some([holder]) if key.touches(*holder) => {}
                Some([]) | None => {
                    return Err(RuntimeError::Audit {
                        fork: *key,
                        reason: "no holder".to_string(),
                    })
                }
                Some(many) => {
                    return Err(RuntimeError::Audit {
                        fork: *key,
                        reason: format!("held by {:?}", many),
                    })
                }
            }
        }

        let report = ShutdownReport {
            agents,
            absorbed_grants,
            elapsed_ms: millis(self.started.elapsed()),
        };
        tracing::info!(
            meals = report.total_meals(),
            absorbed = report.absorbed_grants,
            "table stopped, every fork accounted for"
        );
        Ok(report)
    }
}

/// What an agent task hands back when it ends.
///
/// The mailbox comes back too, so grants still in flight are never dropped.
struct AgentExit {
    philosopher: Philosopher,
    mailbox: Mailbox,
    failure: Option<ProtocolError>,
}

struct Agent<C: Clock> {
    philosopher: Philosopher,
    mailbox: Mailbox,
    directory: Directory,
    bus: EventBus,
    clock: C,
    config: RuntimeConfig,
    rng: StdRng,
    shutdown: watch::Receiver<bool>,
    status: mpsc::UnboundedSender<AgentStatus>,
}

impl<C: Clock> Agent<C> {
    fn id(&self) -> AgentId {
        self.philosopher.id()
    }

    async fn run(mut self) -> AgentExit {
        let failure = match self.cycle().await {
            Ok(()) => self.stop().err(),
            Err(err) => Some(err),
        };
        if let Some(err) = &failure {
            tracing::error!(agent = %self.id(), error = %err, "agent failed");
            let _ = self.status.send(AgentStatus::Failed(self.id()));
        }

        AgentExit {
            philosopher: self.philosopher,
            mailbox: self.mailbox,
            failure,
        }
    }

    /// Think, get hungry, collect forks, eat. Returns when shutdown is signalled.
    async fn cycle(&mut self) -> Result<(), ProtocolError> {
        loop {
            if self.is_shutdown() {
                return Ok(());
            }

            if self.is_sated() {
                let _ = self.status.send(AgentStatus::Sated(self.id()));
                self.serve_until(None).await?;
                return Ok(());
            }

            let think = self.config.think.sample(&mut self.rng);
            if !self.serve_until(Some(think)).await? {
                return Ok(());
            }

            self.apply(PhilosopherInput::Hungry)?;
            if !self.acquire().await? {
                return Ok(());
            }

            // Mail queues up while eating and is handled on release
            let eat = self.config.eat.sample(&mut self.rng);
            tokio::select! {
                _ = tokio::time::sleep(eat) => {}
                _ = self.shutdown.changed() => return Ok(()),
            }
            self.apply(PhilosopherInput::DoneEating)?;
        }
    }

    /// Serve the mailbox while requesting. Returns false on shutdown.
    async fn acquire(&mut self) -> Result<bool, ProtocolError> {
        let period = self.config.tick_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.philosopher.phase() == Phase::Requesting {
            tokio::select! {
                message = self.mailbox.recv() => match message {
                    Some(message) => self.deliver(message)?,
                    None => return Ok(false),
                },
                _ = ticker.tick() => self.apply(PhilosopherInput::Tick)?,
                _ = self.shutdown.changed() => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Serve the mailbox for `limit`, or until shutdown when unbounded.
    /// Returns false on shutdown.
    async fn serve_until(&mut self, limit: Option<Duration>) -> Result<bool, ProtocolError> {
        let deadline = async {
            match limit {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return Ok(true),
                message = self.mailbox.recv() => match message {
                    Some(message) => self.deliver(message)?,
                    None => return Ok(false),
                },
                _ = self.shutdown.changed() => return Ok(false),
            }
        }
    }

    /// Release forks, then grant whatever neighbors already asked for
    fn stop(&mut self) -> Result<(), ProtocolError> {
        self.apply(PhilosopherInput::Stop)?;
        for message in self.mailbox.drain_all() {
            self.deliver(message)?;
        }
        Ok(())
    }

    fn deliver(&mut self, message: Message) -> Result<(), ProtocolError> {
        match self.apply(PhilosopherInput::Deliver(message)) {
            Err(err) if err.is_recoverable() => {
                tracing::warn!(agent = %self.id(), error = %err, "ignoring request");
                Ok(())
            }
            other => other,
        }
    }

    /// Run one transition and carry out its effects.
    ///
    /// Events go out before messages so observers never see a consequence
    /// ahead of its cause.
    fn apply(&mut self, input: PhilosopherInput) -> Result<(), ProtocolError> {
        let (next, effects) = self.philosopher.transition(input, &self.clock)?;
        self.philosopher = next;

        let (sends, events) = effect::partition(effects);
        for event in events {
            self.publish(event);
        }
        for (to, message) in sends {
            self.directory.send(to, message)?;
        }
        Ok(())
    }

    fn publish(&self, event: Event) {
        event.trace();
        self.bus.publish(event);
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn is_sated(&self) -> bool {
        self.config
            .meals_per_agent
            .is_some_and(|limit| self.philosopher.meals() >= limit)
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
