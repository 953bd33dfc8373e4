// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL audit trail of protocol events

use super::bus::EventReceiver;
use super::filter::EventPattern;
use crate::clock::millis;
use crate::effect::Event;
use crate::fork::AgentId;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A logged event with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
    /// Milliseconds since the log was opened
    pub timestamp_ms: u64,
    pub name: String,
    pub agent: AgentId,
    pub event: Event,
}

pub struct EventLog {
    path: PathBuf,
    sequence: u64,
    start_time: Instant,
}

impl EventLog {
    /// Open or create an event log at the given path.
    ///
    /// Appending to an existing file continues its sequence.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let sequence = if path.exists() {
            let file = File::open(&path)?;
            BufReader::new(file)
                .lines()
                .filter(|line| line.as_ref().map_or(true, |l| !l.is_empty()))
                .count() as u64
        } else {
            0
        };

        Ok(Self {
            path,
            sequence,
            start_time: Instant::now(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event
    pub fn append(&mut self, event: Event) -> std::io::Result<EventRecord> {
        let mut records = self.append_all([event])?;
        records
            .pop()
            .ok_or_else(|| std::io::Error::other("no record written"))
    }

    /// Append a batch of events with one file open
    pub fn append_all(
        &mut self,
        events: impl IntoIterator<Item = Event>,
    ) -> std::io::Result<Vec<EventRecord>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut records = Vec::new();

        for event in events {
            self.sequence += 1;
            let record = EventRecord {
                sequence: self.sequence,
                timestamp_ms: millis(self.start_time.elapsed()),
                name: event.name().to_string(),
                agent: event.agent(),
                event,
            };
            let json = serde_json::to_string(&record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{}", json)?;
            records.push(record);
        }

        writer.flush()?;
        Ok(records)
    }

    /// Write every event from `rx` until the stream ends.
    ///
    /// Returns how many records were written.
    pub async fn drain(&mut self, mut rx: EventReceiver) -> std::io::Result<u64> {
        let mut written = 0;
        while let Some(event) = rx.recv().await {
            let mut batch = vec![event];
            while let Ok(more) = rx.try_recv() {
                batch.push(more);
            }
            written += self.append_all(batch)?.len() as u64;
        }
        Ok(written)
    }

    pub fn read_all(&self) -> std::io::Result<Vec<EventRecord>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(&line)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            records.push(record);
        }

        Ok(records)
    }

    /// Query events by name pattern
    pub fn query(&self, pattern: &EventPattern) -> std::io::Result<Vec<EventRecord>> {
        let all = self.read_all()?;
        Ok(all
            .into_iter()
            .filter(|r| pattern.matches(&r.name))
            .collect())
    }

    /// Events recorded for one agent
    pub fn for_agent(&self, agent: AgentId) -> std::io::Result<Vec<EventRecord>> {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(|r| r.agent == agent).collect())
    }

    /// Query events after a sequence number
    pub fn after(&self, sequence: u64) -> std::io::Result<Vec<EventRecord>> {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(|r| r.sequence > sequence).collect())
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
