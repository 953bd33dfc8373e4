// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table configuration
//!
//! Loaded from TOML. Durations use humantime strings ("250ms", "5s").
//! Every field has a default, so an empty file is a valid config.

mod pace;

pub use pace::PaceRange;

use crate::runtime::RuntimeConfig;
use crate::table::{Table, TableError};
use crate::topology::{Topology, TopologyKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    pub agents: u32,
    pub topology: TopologyKind,
    /// Hungry longer than this and an agent reports itself starving
    #[serde(with = "humantime_serde")]
    pub starvation_threshold: Duration,
    /// How often a hungry agent checks the starvation threshold
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Stop requesting after this many meals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meals_per_agent: Option<u64>,
    pub think: PaceRange,
    pub eat: PaceRange,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            agents: 5,
            topology: TopologyKind::Ring,
            starvation_threshold: Duration::from_secs(5),
            tick_interval: Duration::from_secs(1),
            meals_per_agent: None,
            think: PaceRange::new(Duration::from_millis(100), Duration::from_millis(300)),
            eat: PaceRange::new(Duration::from_millis(100), Duration::from_millis(300)),
        }
    }
}

impl TableConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), agents = config.agents, "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents < 2 {
            return Err(ConfigError::Invalid(format!(
                "agents must be at least 2, got {}",
                self.agents
            )));
        }
        if !self.think.is_valid() {
            return Err(ConfigError::Invalid("think.min is above think.max".into()));
        }
        if !self.eat.is_valid() {
            return Err(ConfigError::Invalid("eat.min is above eat.max".into()));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid("tick_interval must be non-zero".into()));
        }
        if self.meals_per_agent == Some(0) {
            return Err(ConfigError::Invalid("meals_per_agent must be at least 1".into()));
        }
        Ok(())
    }

    pub fn topology(&self) -> Result<Topology, TableError> {
        Ok(Topology::build(self.topology, self.agents)?)
    }

    /// Seat a table with the default initial ownership
    pub fn table(&self) -> Result<Table, TableError> {
        Table::new(self.topology()?, self.starvation_threshold)
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            think: self.think,
            eat: self.eat,
            tick_interval: self.tick_interval,
            meals_per_agent: self.meals_per_agent,
            seed: None,
        }
    }
}
