// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::line::{classify, LineKind, UnitEvent};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use fw_core::{Frame, ProjectInfo, WorkUnitResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// One attempt of one unit in one slot, as recorded by the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitRun {
    pub queue_index: u32,
    pub slot_id: u32,
    /// Time of the `Starting` line.
    pub started: Option<DateTime<Utc>>,
    pub project: Option<ProjectInfo>,
    pub frames: BTreeMap<u32, Frame>,
    /// Completed-steps lines seen, repeats included.
    pub frames_observed: usize,
    pub core_version: Option<String>,
    pub platform: Option<String>,
    pub result: WorkUnitResult,
    #[serde(skip)]
    last_frame_at: Option<DateTime<Utc>>,
}

impl UnitRun {
    fn new(queue_index: u32, slot_id: u32) -> Self {
        Self { queue_index, slot_id, ..Self::default() }
    }

    fn record_frame(&mut self, percent: u32, at: DateTime<Utc>) {
        let duration = self
            .last_frame_at
            .and_then(|prev| (at - prev).to_std().ok())
            .unwrap_or_default();
        self.frames.insert(percent, Frame { id: percent, timestamp: at, duration });
        self.frames_observed += 1;
        self.last_frame_at = Some(at);
    }
}

/// Units processed by one slot during one client run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlotRun {
    pub slot_id: u32,
    pub units: Vec<UnitRun>,
}

/// Period of client uptime, from one `Log Started` to the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRun {
    pub started: DateTime<Utc>,
    pub slots: BTreeMap<u32, SlotRun>,
}

impl ClientRun {
    fn new(started: DateTime<Utc>) -> Self {
        Self { started, slots: BTreeMap::new() }
    }

    fn unit_mut(&mut self, slot_id: u32, queue: u32, fresh: bool) -> &mut UnitRun {
        let slot = self.slots.entry(slot_id).or_insert_with(|| SlotRun { slot_id, units: Vec::new() });
        let existing = slot.units.iter().rposition(|u| u.queue_index == queue);
        let index = match existing {
            Some(index) if !fresh => index,
            _ => {
                slot.units.push(UnitRun::new(queue, slot_id));
                slot.units.len() - 1
            }
        };
        &mut slot.units[index]
    }
}

/// Line timestamps only carry the time of day; the date is tracked from
/// the last `Log Started` and rolled forward when the clock wraps.
#[derive(Debug, Clone, Default)]
struct Calendar {
    date: Option<NaiveDate>,
    last: Option<NaiveTime>,
}

impl Calendar {
    fn reset(&mut self, started: DateTime<Utc>) {
        self.date = Some(started.date_naive());
        self.last = Some(started.time());
    }

    fn stamp(&mut self, time: NaiveTime) -> Option<DateTime<Utc>> {
        let mut date = self.date?;
        if self.last.is_some_and(|last| time < last) {
            date = date.checked_add_days(Days::new(1))?;
            self.date = Some(date);
        }
        self.last = Some(time);
        Some(date.and_time(time).and_utc())
    }
}

/// Structured history of a client's log: client runs, slot runs, unit runs.
///
/// Fed incrementally; a trailing partial line is held until its newline
/// arrives.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    runs: Vec<ClientRun>,
    calendar: Calendar,
    partial: String,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> &[ClientRun] {
        &self.runs
    }

    /// Append log text.
    pub fn feed(&mut self, text: &str) {
        self.partial.push_str(text);
        let Some(end) = self.partial.rfind('\n') else {
            return;
        };
        let complete: String = self.partial.drain(..=end).collect();
        for line in complete.lines() {
            self.parse_line(line);
        }
    }

    fn parse_line(&mut self, line: &str) {
        match classify(line) {
            LineKind::LogStarted(started) => {
                self.calendar.reset(started);
                self.runs.push(ClientRun::new(started));
            }
            LineKind::Unit { time, queue, slot, event } => {
                let Some(run) = self.runs.last_mut() else {
                    return;
                };
                let Some(at) = self.calendar.stamp(time) else {
                    return;
                };
                let unit = run.unit_mut(slot, queue, event == UnitEvent::Starting);
                match event {
                    UnitEvent::Starting => unit.started = Some(at),
                    UnitEvent::Project(project) => unit.project = Some(project),
                    UnitEvent::Completed { percent, .. } => unit.record_frame(percent, at),
                    UnitEvent::CoreVersion(version) => unit.core_version = Some(version),
                    UnitEvent::Platform(platform) => unit.platform = Some(platform),
                    UnitEvent::Returned(result) => unit.result = result,
                    UnitEvent::Other => {}
                }
            }
            LineKind::Other => {}
        }
    }

    /// Most recent unit run for a queue slot and project.
    pub fn find_unit(&self, slot_id: u32, queue_index: u32, project: ProjectInfo) -> Option<&UnitRun> {
        self.runs.iter().rev().find_map(|run| {
            run.slots.get(&slot_id).and_then(|slot| {
                slot.units
                    .iter()
                    .rev()
                    .find(|u| u.queue_index == queue_index && u.project == Some(project))
            })
        })
    }
}

#[cfg(test)]
#[path = "run_log_tests.rs"]
mod tests;
