// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work items: one unit of assigned computation held by an agent slot.
//!
//! A `WorkItem` is rebuilt from scratch on every refresh and replaced
//! wholesale; nothing mutates a published item.

use crate::protein::Protein;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Project / run / clone / generation tuple naming a work unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub project: u32,
    pub run: u32,
    pub clone: u32,
    pub gen: u32,
}

impl ProjectInfo {
    pub fn new(project: u32, run: u32, clone: u32, gen: u32) -> Self {
        Self { project, run, clone, gen }
    }

    /// All zero means the agent has not reported a project yet.
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for ProjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{} (R{}, C{}, G{})", self.project, self.run, self.clone, self.gen)
    }
}

/// Result code a core reports when it returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkUnitResult {
    #[default]
    Unknown,
    FinishedUnit,
    EarlyUnitEnd,
    UnstableMachine,
    Interrupted,
    BadWorkUnit,
    CoreOutdated,
    GpuMemtestError,
    ClientCoreError,
    BadFrameChecksum,
}

crate::simple_display! {
    WorkUnitResult {
        Unknown => "UNKNOWN",
        FinishedUnit => "FINISHED_UNIT",
        EarlyUnitEnd => "EARLY_UNIT_END",
        UnstableMachine => "UNSTABLE_MACHINE",
        Interrupted => "INTERRUPTED",
        BadWorkUnit => "BAD_WORK_UNIT",
        CoreOutdated => "CORE_OUTDATED",
        GpuMemtestError => "GPU_MEMTEST_ERROR",
        ClientCoreError => "CLIENT_CORE_ERROR",
        BadFrameChecksum => "BAD_FRAME_CHECKSUM",
    }
}

impl WorkUnitResult {
    /// Parse the code name printed by the client (e.g. `FINISHED_UNIT`).
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "FINISHED_UNIT" => Self::FinishedUnit,
            "EARLY_UNIT_END" => Self::EarlyUnitEnd,
            "UNSTABLE_MACHINE" => Self::UnstableMachine,
            "INTERRUPTED" => Self::Interrupted,
            "BAD_WORK_UNIT" => Self::BadWorkUnit,
            "CORE_OUTDATED" => Self::CoreOutdated,
            "GPU_MEMTEST_ERROR" => Self::GpuMemtestError,
            "CLIENT_CORE_ERROR" => Self::ClientCoreError,
            "BAD_FRAME_CHECKSUM" => Self::BadFrameChecksum,
            _ => Self::Unknown,
        }
    }

    /// Results after which the unit will never run again.
    pub fn is_terminating(&self) -> bool {
        matches!(
            self,
            Self::FinishedUnit
                | Self::EarlyUnitEnd
                | Self::UnstableMachine
                | Self::BadWorkUnit
                | Self::ClientCoreError
                | Self::BadFrameChecksum
        )
    }
}

/// One completed-steps record from the run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Percent complete reported by the core.
    pub id: u32,
    pub timestamp: DateTime<Utc>,
    /// Time since the previous frame; zero for the first one observed.
    pub duration: Duration,
}

/// One attempt of one work unit as seen on a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Queue index on the agent.
    pub id: u32,
    pub slot_id: u32,
    pub project: ProjectInfo,
    pub assigned: Option<DateTime<Utc>>,
    pub timeout: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub retrieved: DateTime<Utc>,
    /// Core id from the queue, e.g. `0xa8`.
    pub core: String,
    /// Core version printed in the run log.
    pub core_version: Option<String>,
    /// When the unit started processing according to the run log.
    pub unit_start: Option<DateTime<Utc>>,
    pub frames: BTreeMap<u32, Frame>,
    pub frames_observed: usize,
    pub result: WorkUnitResult,
    pub platform: Option<String>,
    pub protein: Option<Protein>,
}

impl WorkItem {
    /// Same project attempt: identical project tuple and assignment time.
    pub fn same_attempt(&self, other: &WorkItem) -> bool {
        self.project == other.project && self.assigned == other.assigned
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.values().next_back()
    }

    /// Average duration of the observed frames (zero without frames).
    pub fn frame_time(&self) -> Duration {
        let timed: Vec<Duration> =
            self.frames.values().map(|f| f.duration).filter(|d| !d.is_zero()).collect();
        if timed.is_empty() {
            return Duration::ZERO;
        }
        timed.iter().sum::<Duration>() / timed.len() as u32
    }
}

crate::builder! {
    pub struct WorkItemBuilder => WorkItem {
        set {
            id: u32 = 0,
            slot_id: u32 = 0,
            project: ProjectInfo = ProjectInfo::default(),
            assigned: Option<DateTime<Utc>> = None,
            timeout: Option<DateTime<Utc>> = None,
            finished: Option<DateTime<Utc>> = None,
            retrieved: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH,
            frames: BTreeMap<u32, Frame> = BTreeMap::new(),
            frames_observed: usize = 0,
            result: WorkUnitResult = WorkUnitResult::Unknown,
        }
        computed {
            deadline: Option<DateTime<Utc>> = None,
            core: String = "0xa8".to_string(),
            core_version: Option<String> = None,
            unit_start: Option<DateTime<Utc>> = None,
            platform: Option<String> = None,
            protein: Option<Protein> = None,
        }
    }
}

/// Work items of one slot, ordered by queue id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemCollection {
    items: BTreeMap<u32, WorkItem>,
    /// Queue id of the item the slot is working on.
    pub current_id: Option<u32>,
}

impl WorkItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, replacing any item with the same queue id.
    pub fn insert(&mut self, item: WorkItem) {
        self.items.insert(item.id, item);
    }

    pub fn get(&self, id: u32) -> Option<&WorkItem> {
        self.items.get(&id)
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.items.contains_key(&id)
    }

    /// Whether an item for the same project attempt is present.
    pub fn contains_attempt(&self, item: &WorkItem) -> bool {
        self.items.values().any(|i| i.same_attempt(item))
    }

    pub fn current(&self) -> Option<&WorkItem> {
        self.current_id.and_then(|id| self.items.get(&id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
