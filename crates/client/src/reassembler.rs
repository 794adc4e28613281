// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Folds pushed messages into an [`AgentSnapshot`].
//!
//! The reader loop enqueues; a refresh drains. Every category is replaced
//! wholesale except `slot-options`, which merges into its slot.

use crate::log::RunLog;
use crate::payload::{Info, Options, SlotInfo, SlotOptions, UnitInfo};
use chrono::{DateTime, Utc};
use fw_wire::{Message, MessageType, ProtocolError};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Initial log transfers arrive in chunks of this size; a shorter chunk ends
/// the transfer.
pub const LOG_BUFFER_THRESHOLD: usize = u16::MAX as usize;

/// Latest known state of one agent.
#[derive(Debug, Clone, Default)]
pub struct AgentSnapshot {
    pub heartbeat: Option<DateTime<Utc>>,
    pub info: Option<Info>,
    pub options: Option<Options>,
    pub slots: Vec<SlotInfo>,
    pub units: Vec<UnitInfo>,
    pub log: Arc<RunLog>,
}

impl AgentSnapshot {
    pub fn slot(&self, id: u32) -> Option<&SlotInfo> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// Queue entries held by one slot, in queue order.
    pub fn units_for_slot(&self, slot_id: u32) -> impl Iterator<Item = &UnitInfo> + Clone {
        self.units.iter().filter(move |u| u.slot == slot_id)
    }
}

/// Result of a drain: the folded snapshot and the messages consumed.
#[derive(Debug, Clone)]
pub struct Drained {
    pub snapshot: Arc<AgentSnapshot>,
    pub messages: Vec<Message>,
}

#[derive(Default)]
struct Folded {
    snapshot: Arc<AgentSnapshot>,
    log_buffer: Vec<String>,
}

#[derive(Default)]
pub struct Reassembler {
    pending: Mutex<Vec<Message>>,
    folded: Mutex<Folded>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, message: Message) {
        self.pending.lock().push(message);
    }

    /// Current snapshot without consuming pending messages.
    pub fn snapshot(&self) -> Arc<AgentSnapshot> {
        Arc::clone(&self.folded.lock().snapshot)
    }

    /// Fold every pending message and return the new snapshot.
    pub fn drain(&self) -> Drained {
        let messages = std::mem::take(&mut *self.pending.lock());
        let mut folded = self.folded.lock();
        for message in &messages {
            folded.apply(message);
        }
        Drained { snapshot: Arc::clone(&folded.snapshot), messages }
    }
}

impl Folded {
    fn apply(&mut self, message: &Message) {
        match &message.message_type {
            MessageType::Heartbeat => {
                Arc::make_mut(&mut self.snapshot).heartbeat = Some(message.received);
            }
            MessageType::Info => {
                if let Some(info) = parse(message) {
                    Arc::make_mut(&mut self.snapshot).info = Some(info);
                }
            }
            MessageType::Options => {
                if let Some(options) = parse(message) {
                    Arc::make_mut(&mut self.snapshot).options = Some(options);
                }
            }
            MessageType::SlotInfo => {
                if let Some(slots) = parse(message) {
                    Arc::make_mut(&mut self.snapshot).slots = slots;
                }
            }
            MessageType::QueueInfo => {
                if let Some(units) = parse(message) {
                    Arc::make_mut(&mut self.snapshot).units = units;
                }
            }
            MessageType::SlotOptions => {
                if let Some(options) = parse::<SlotOptions>(message) {
                    self.merge_slot_options(options);
                }
            }
            MessageType::LogRestart => {
                if !self.snapshot.log.is_empty() {
                    tracing::debug!("log restarted, discarding run log");
                    Arc::make_mut(&mut self.snapshot).log = Arc::new(RunLog::new());
                }
                // a transfer cut short by a dropped connection starts over
                self.log_buffer.clear();
                self.apply_log(message.log_text());
            }
            MessageType::LogUpdate => self.apply_log(message.log_text()),
            MessageType::Other(tag) => {
                tracing::trace!(message_type = %tag, "ignoring message");
            }
        }
    }

    fn merge_slot_options(&mut self, options: SlotOptions) {
        let Some(machine_id) = options.machine_id() else {
            tracing::debug!("slot-options without machine-id");
            return;
        };
        let snapshot = Arc::make_mut(&mut self.snapshot);
        match snapshot.slots.iter_mut().find(|s| s.id == machine_id) {
            Some(slot) => slot.options.extend(options.values),
            None => tracing::debug!(slot = machine_id, "slot-options for unknown slot"),
        }
    }

    fn apply_log(&mut self, text: String) {
        if !self.snapshot.log.is_empty() {
            let snapshot = Arc::make_mut(&mut self.snapshot);
            Arc::make_mut(&mut snapshot.log).feed(&text);
            return;
        }

        let last_chunk = text.len() < LOG_BUFFER_THRESHOLD;
        self.log_buffer.push(text);
        if !last_chunk {
            return;
        }

        let mut log = RunLog::new();
        for chunk in self.log_buffer.drain(..) {
            log.feed(&chunk);
        }
        tracing::debug!(runs = log.runs().len(), "replayed buffered log");
        Arc::make_mut(&mut self.snapshot).log = Arc::new(log);
    }
}

fn parse<T: DeserializeOwned>(message: &Message) -> Option<T> {
    match message.parse::<T>() {
        Ok(value) => Some(value),
        Err(ProtocolError::Payload { message_type, source }) => {
            tracing::warn!(%message_type, error = %source, "dropping unparseable payload");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "dropping message");
            None
        }
    }
}

#[cfg(test)]
#[path = "reassembler_tests.rs"]
mod tests;
