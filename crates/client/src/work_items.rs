// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconstruction of a slot's work items from queue state and the run log.
//!
//! Queue entries give identity and deadlines; the run log gives progress
//! and results. A unit that leaves the queue between refreshes is completed
//! once more from the log so it is reported finished instead of vanishing.

use crate::log::UnitRun;
use crate::payload::{UnitInfo, UnitState};
use crate::reassembler::AgentSnapshot;
use chrono::{DateTime, Utc};
use fw_core::{ProteinService, WorkItem, WorkItemCollection};

/// Everything one slot's reconstruction needs.
pub struct BuildInput<'a> {
    pub snapshot: &'a AgentSnapshot,
    pub slot_id: u32,
    pub slot_description: &'a str,
    /// Current work item from the previous refresh of this slot.
    pub previous: Option<&'a WorkItem>,
    pub now: DateTime<Utc>,
    pub proteins: &'a dyn ProteinService,
}

pub fn build_collection(input: &BuildInput<'_>) -> WorkItemCollection {
    let mut collection = WorkItemCollection::new();
    let log = &input.snapshot.log;

    for unit in input.snapshot.units_for_slot(input.slot_id) {
        let run = log.find_unit(input.slot_id, unit.id, unit.project_info());
        collection.insert(from_queue(input, unit, run));
    }
    collection.current_id = current_id(input.snapshot.units_for_slot(input.slot_id));

    if let Some(previous) = input.previous {
        let represented = collection.contains_id(previous.id) || collection.contains_attempt(previous);
        if !represented {
            match log.find_unit(input.slot_id, previous.id, previous.project) {
                Some(run) => {
                    tracing::debug!(
                        slot = input.slot_id,
                        queue = previous.id,
                        project = %previous.project,
                        "completing work item that left the queue"
                    );
                    collection.insert(carried_forward(input, previous, run));
                }
                None => tracing::debug!(
                    slot = input.slot_id,
                    queue = previous.id,
                    project = %previous.project,
                    "previous work item not in run log, dropping"
                ),
            }
        }
    }

    collection
}

/// First RUNNING entry, else first READY entry.
fn current_id<'a>(units: impl Iterator<Item = &'a UnitInfo> + Clone) -> Option<u32> {
    let first_in = |state: UnitState| units.clone().find(|u| u.state == state).map(|u| u.id);
    first_in(UnitState::Running).or_else(|| first_in(UnitState::Ready))
}

fn from_queue(input: &BuildInput<'_>, unit: &UnitInfo, run: Option<&UnitRun>) -> WorkItem {
    let project = unit.project_info();
    let mut item = WorkItem {
        id: unit.id,
        slot_id: input.slot_id,
        project,
        assigned: unit.assigned,
        timeout: unit.timeout,
        deadline: unit.deadline,
        finished: None,
        retrieved: input.now,
        core: unit.core.clone(),
        core_version: None,
        unit_start: None,
        frames: Default::default(),
        frames_observed: 0,
        result: Default::default(),
        platform: None,
        protein: lookup(input, project.project),
    };
    if let Some(run) = run {
        apply_run(&mut item, run, input.now);
    }
    if item.platform.is_none() && !input.slot_description.is_empty() {
        item.platform = Some(input.slot_description.to_string());
    }
    item
}

fn carried_forward(input: &BuildInput<'_>, previous: &WorkItem, run: &UnitRun) -> WorkItem {
    let mut item = previous.clone();
    item.retrieved = input.now;
    apply_run(&mut item, run, input.now);
    item.finished = Some(previous.finished.unwrap_or(input.now));
    item
}

fn apply_run(item: &mut WorkItem, run: &UnitRun, now: DateTime<Utc>) {
    item.unit_start = run.started;
    item.frames = run.frames.clone();
    item.frames_observed = run.frames_observed;
    item.result = run.result;
    if run.core_version.is_some() {
        item.core_version = run.core_version.clone();
    }
    if run.platform.is_some() {
        item.platform = run.platform.clone();
    }
    if run.result.is_terminating() {
        item.finished = Some(now);
    }
}

fn lookup(input: &BuildInput<'_>, project: u32) -> Option<fw_core::Protein> {
    if project == 0 {
        return None;
    }
    input.proteins.get(project)
}

#[cfg(test)]
#[path = "work_items_tests.rs"]
mod tests;
