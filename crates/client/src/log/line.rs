// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classification of single log lines.

use chrono::{DateTime, NaiveTime, Utc};
use fw_core::{ProjectInfo, WorkUnitResult};

/// What a log line says, as far as work item reconstruction cares.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineKind {
    /// `*** Log Started <time> ***` outside a unit: the client (re)started.
    LogStarted(DateTime<Utc>),
    /// A line written on behalf of one unit in one slot.
    Unit { time: NaiveTime, queue: u32, slot: u32, event: UnitEvent },
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UnitEvent {
    Starting,
    Project(ProjectInfo),
    Completed { steps: u64, total: u64, percent: u32 },
    CoreVersion(String),
    Platform(String),
    Returned(WorkUnitResult),
    Other,
}

pub(crate) fn classify(line: &str) -> LineKind {
    let line = line.trim_end();
    if let Some(kind) = unit_line(line) {
        return kind;
    }
    match log_started(line) {
        Some(time) => LineKind::LogStarted(time),
        None => LineKind::Other,
    }
}

fn log_started(line: &str) -> Option<DateTime<Utc>> {
    let rest = line.split("Log Started").nth(1)?;
    let token = rest.trim().trim_matches('*').trim();
    crate::payload::parse_time(token)
}

/// `HH:MM:SS:WUqq:FSss:<rest>`
fn unit_line(line: &str) -> Option<LineKind> {
    let mut parts = line.splitn(6, ':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    let queue = parts.next()?.strip_prefix("WU")?.parse().ok()?;
    let slot = parts.next()?.strip_prefix("FS")?.parse().ok()?;
    let rest = parts.next().unwrap_or_default();
    let time = NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, s.parse().ok()?)?;
    Some(LineKind::Unit { time, queue, slot, event: unit_event(rest) })
}

fn unit_event(rest: &str) -> UnitEvent {
    let rest = strip_core_prefix(rest).trim();
    if rest == "Starting" {
        return UnitEvent::Starting;
    }
    if let Some(project) = rest.strip_prefix("Project:").and_then(project_info) {
        return UnitEvent::Project(project);
    }
    if let Some(completed) = rest.strip_prefix("Completed ").and_then(completed) {
        return completed;
    }
    if let Some(code) = rest.strip_prefix("FahCore returned:") {
        let code = code.split_whitespace().next().unwrap_or_default();
        return UnitEvent::Returned(WorkUnitResult::parse(code));
    }
    if let Some(version) = rest.strip_prefix("Version") {
        let version = version.trim_start_matches(':').trim();
        if !version.is_empty() {
            return UnitEvent::CoreVersion(version.to_string());
        }
    }
    if rest.starts_with("Platform") {
        let detail = rest.split_once(':').map_or(rest, |(_, d)| d).trim();
        return UnitEvent::Platform(detail.to_string());
    }
    UnitEvent::Other
}

/// Drop a `0xa8:` style core prefix.
fn strip_core_prefix(rest: &str) -> &str {
    match rest.split_once(':') {
        Some((core, tail)) if core.starts_with("0x") && core.len() <= 6 => tail,
        _ => rest,
    }
}

/// ` 7610 (Run 630, Clone 0, Gen 59)`
fn project_info(text: &str) -> Option<ProjectInfo> {
    let numbers: Vec<u32> = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers.as_slice() {
        [project, run, clone, gen] => Some(ProjectInfo::new(*project, *run, *clone, *gen)),
        _ => None,
    }
}

/// `1500 out of 500000 steps (0%)`
fn completed(text: &str) -> Option<UnitEvent> {
    let (steps, rest) = text.split_once(" out of ")?;
    let (total, rest) = rest.split_once(" steps")?;
    let percent = rest.trim().trim_start_matches('(').split('%').next()?;
    Some(UnitEvent::Completed {
        steps: steps.trim().parse().ok()?,
        total: total.trim().parse().ok()?,
        percent: percent.trim().parse().ok()?,
    })
}

#[cfg(test)]
#[path = "line_tests.rs"]
mod tests;
