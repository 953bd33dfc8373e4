// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mensa simulate` - Deterministic simulation with invariant checks

use super::TableArgs;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use mensa_core::Simulation;
use serde::Serialize;
use std::fmt;

#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Number of scheduling steps
    #[arg(short, long, default_value_t = 10_000)]
    pub steps: u64,

    /// Seed for the random schedule
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Stop early once every agent has eaten this many times
    #[arg(short, long)]
    pub meals: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    agents: u32,
    topology: String,
    seed: u64,
    steps: u64,
    events: usize,
    meals: Vec<u64>,
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simulated {} steps: {} agents, {} topology, seed {}",
            self.steps, self.agents, self.topology, self.seed
        )?;
        writeln!(f, "{:<8} MEALS", "AGENT")?;
        for (agent, meals) in self.meals.iter().enumerate() {
            writeln!(f, "{:<8} {}", agent, meals)?;
        }
        writeln!(f, "total meals: {}", self.meals.iter().sum::<u64>())?;
        writeln!(f, "invariants held at every step")
    }
}

pub fn simulate(args: SimulateArgs) -> Result<()> {
    let config = args.table.resolve()?;
    let mut sim = Simulation::new(config.table()?);
    if let Some(meals) = args.meals {
        sim = sim.with_meal_limit(meals);
    }

    sim.run_random(args.steps, args.seed)
        .with_context(|| format!("simulation with seed {} failed", args.seed))?;
    sim.stop_all().context("draining the table failed")?;

    let summary = SimulationSummary {
        agents: config.agents,
        topology: config.topology.to_string(),
        seed: args.seed,
        steps: sim.steps(),
        events: sim.events().len(),
        meals: sim.meals(),
    };
    output::print(&summary, OutputFormat::from_json_flag(args.json))
}
