// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod config;
pub mod run;
pub mod simulate;

use anyhow::{Context, Result};
use clap::Args;
use mensa_core::{TableConfig, TopologyKind};
use std::path::PathBuf;

/// Flags that shape the table, layered over the config file
#[derive(Args, Debug, Default)]
pub struct TableArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of agents at the table
    #[arg(short, long)]
    pub agents: Option<u32>,

    /// Neighbor layout: ring or complete
    #[arg(short, long)]
    pub topology: Option<TopologyKind>,
}

impl TableArgs {
    /// Load the config file (or defaults), then apply flag overrides
    pub fn resolve(&self) -> Result<TableConfig> {
        let mut config = match &self.config {
            Some(path) => TableConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TableConfig::default(),
        };
        if let Some(agents) = self.agents {
            config.agents = agents;
        }
        if let Some(topology) = self.topology {
            config.topology = topology;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
