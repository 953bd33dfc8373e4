// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Selecting events by name and by agent

use crate::effect::Event;
use crate::fork::AgentId;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment
    One,
    /// `**`: the rest of the name, possibly nothing
    Rest,
}

/// Glob over `:`-separated event names such as `fork:granted`.
///
/// `fork:*` matches any fork event, `*:eating` matches `agent:eating`,
/// and `**` matches everything. An empty pattern matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPattern {
    text: String,
    segments: Vec<Segment>,
}

impl EventPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = if pattern.is_empty() {
            Vec::new()
        } else {
            pattern
                .split(':')
                .map(|part| match part {
                    "*" => Segment::One,
                    "**" => Segment::Rest,
                    literal => Segment::Literal(literal.to_string()),
                })
                .collect()
        };
        Self {
            text: pattern.to_string(),
            segments,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.segments.is_empty() {
            return false;
        }
        let mut parts = name.split(':');
        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::One => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => {
                    if parts.next() != Some(literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for EventPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

impl std::str::FromStr for EventPattern {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Which events a bus subscriber receives.
///
/// With no patterns every name passes; with no agents every agent passes.
/// An event must pass both to be delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    patterns: Vec<EventPattern>,
    agents: BTreeSet<AgentId>,
}

impl EventFilter {
    /// Everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Events whose name matches `pattern`
    pub fn named(pattern: impl Into<EventPattern>) -> Self {
        Self::all().or_named(pattern)
    }

    /// Also accept names matching `pattern`
    pub fn or_named(mut self, pattern: impl Into<EventPattern>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Only events acted out by `agent` (repeat to allow several)
    pub fn for_agent(mut self, agent: AgentId) -> Self {
        self.agents.insert(agent);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        let name = event.name();
        let name_ok = self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(name));
        let agent_ok = self.agents.is_empty() || self.agents.contains(&event.agent());
        name_ok && agent_ok
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patterns.is_empty() {
            f.write_str("**")?;
        } else {
            let names: Vec<&str> = self.patterns.iter().map(EventPattern::as_str).collect();
            f.write_str(&names.join(","))?;
        }
        if !self.agents.is_empty() {
            let agents: Vec<String> = self.agents.iter().map(ToString::to_string).collect();
            write!(f, " @ {}", agents.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
