// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mensa run` - Run a live table

use super::TableArgs;
use crate::output::{self, fork_list, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use mensa_core::{
    AgentId, Event, EventBus, EventFilter, EventLog, EventPattern, EventReceiver, Runtime,
    ShutdownReport, SystemClock, TableStatus,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// How long a table runs when neither a duration nor a meal limit is given
const DEFAULT_DURATION: Duration = Duration::from_secs(5);

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Stop after this long (e.g. "5s", "1m 30s")
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Stop once every agent has eaten this many times
    #[arg(short, long)]
    pub meals: Option<u64>,

    /// Append every event to this JSONL file
    #[arg(long)]
    pub event_log: Option<PathBuf>,

    /// Only log events whose name matches (e.g. "agent:*"); repeatable
    #[arg(long = "log-events", value_name = "PATTERN", requires = "event_log")]
    pub log_events: Vec<EventPattern>,

    /// Seed for pacing delays
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum StopReason {
    Elapsed,
    Sated,
    Interrupted,
    AgentFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Elapsed => write!(f, "duration elapsed"),
            StopReason::Sated => write!(f, "every agent reached its meal limit"),
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::AgentFailed => write!(f, "an agent failed"),
        }
    }
}

#[derive(Debug, Serialize)]
struct RunSummary {
    stopped: StopReason,
    #[serde(flatten)]
    report: ShutdownReport,
    total_meals: u64,
    /// Starvation reports per agent; agents that never starved are left out
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    starving: BTreeMap<AgentId, u64>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "stopped: {}", self.stopped)?;
        writeln!(f, "{:<8} {:<8} {:<8} FORKS", "AGENT", "MEALS", "STARVED")?;
        for agent in &self.report.agents {
            writeln!(
                f,
                "{:<8} {:<8} {:<8} {}",
                agent.agent.0,
                agent.meals,
                self.starving.get(&agent.agent).copied().unwrap_or(0),
                fork_list(&agent.forks)
            )?;
        }
        writeln!(f, "total meals: {}", self.total_meals)?;
        writeln!(f, "every fork accounted for")
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = args.table.resolve()?;
    if let Some(meals) = args.meals {
        config.meals_per_agent = Some(meals);
        config.validate()?;
    }

    let table = config.table()?;
    let mut runtime_config = config.runtime();
    runtime_config.seed = args.seed;

    let bus = EventBus::new();
    let (starving_sub, starving_rx) = bus.subscribe(EventFilter::named("agent:starving"));
    let starving_task = tokio::spawn(count_starving(starving_rx));

    let log_task = match &args.event_log {
        Some(path) => {
            let mut log = EventLog::open(path)
                .with_context(|| format!("opening event log {}", path.display()))?;
            let filter = args
                .log_events
                .iter()
                .cloned()
                .fold(EventFilter::all(), |filter, pattern| filter.or_named(pattern));
            tracing::debug!(path = %path.display(), filter = %filter, "logging events");
            let (id, events) = bus.subscribe(filter);
            Some((id, tokio::spawn(async move { log.drain(events).await })))
        }
        None => None,
    };

    let duration = match (args.duration, config.meals_per_agent) {
        (Some(duration), _) => Some(duration),
        (None, Some(_)) => None,
        (None, None) => Some(DEFAULT_DURATION),
    };
    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };

    let mut handle = Runtime::spawn(table, runtime_config, bus.clone(), SystemClock);

    let stopped = tokio::select! {
        _ = deadline => StopReason::Elapsed,
        status = handle.wait() => match status {
            TableStatus::Sated => StopReason::Sated,
            TableStatus::AgentFailed(agent) => {
                tracing::error!(agent = %agent, "agent failed, stopping table");
                StopReason::AgentFailed
            }
        },
        _ = tokio::signal::ctrl_c() => StopReason::Interrupted,
    };
    tracing::info!(reason = %stopped, "stopping");

    let report = handle.shutdown().await;
    if let Some((id, task)) = log_task {
        bus.unsubscribe(id);
        let written = task.await.context("event log writer panicked")??;
        tracing::debug!(records = written, "event log flushed");
    }
    bus.unsubscribe(starving_sub);
    let starving = starving_task.await.context("starvation counter panicked")?;
    let report = report.context("table did not shut down cleanly")?;

    let summary = RunSummary {
        stopped,
        total_meals: report.total_meals(),
        report,
        starving,
    };
    output::print(&summary, OutputFormat::from_json_flag(args.json))
}

/// Tally starvation reports until the subscription closes
async fn count_starving(mut events: EventReceiver) -> BTreeMap<AgentId, u64> {
    let mut counts = BTreeMap::new();
    while let Some(event) = events.recv().await {
        if let Event::Starving { agent, .. } = event {
            *counts.entry(agent).or_insert(0) += 1;
        }
    }
    counts
}
