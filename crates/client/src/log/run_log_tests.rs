// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use std::time::Duration;

const LOG: &str = "\
*********************** Log Started 2020-03-28T08:33:55Z ***********************
08:33:55:******************************* Date: 2020-03-28 *******************************
08:33:56:WU01:FS00:Starting
08:33:56:WU01:FS00:Running FahCore: /usr/bin/FAHCoreWrapper
08:33:57:WU01:FS00:0xa8:*********************** Log Started 2020-03-28T08:33:57Z ***********************
08:33:57:WU01:FS00:0xa8:Version: 0.0.11
08:33:57:WU01:FS00:0xa8:Project: 7610 (Run 630, Clone 0, Gen 59)
08:34:10:WU01:FS00:0xa8:Completed 0 out of 500000 steps (0%)
08:40:10:WU01:FS00:0xa8:Completed 5000 out of 500000 steps (1%)
08:46:20:WU01:FS00:0xa8:Completed 10000 out of 500000 steps (2%)
";

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 3, 28, h, m, s).unwrap()
}

#[test]
fn replays_client_and_unit_runs() {
    let mut log = RunLog::new();
    log.feed(LOG);

    assert_eq!(log.runs().len(), 1);
    assert_eq!(log.runs()[0].started, at(8, 33, 55));

    let unit = log.find_unit(0, 1, ProjectInfo::new(7610, 630, 0, 59)).unwrap();
    assert_eq!(unit.started, Some(at(8, 33, 56)));
    assert_eq!(unit.core_version.as_deref(), Some("0.0.11"));
    assert_eq!(unit.frames.len(), 3);
    assert_eq!(unit.frames_observed, 3);
    assert_eq!(unit.frames[&0].duration, Duration::ZERO);
    assert_eq!(unit.frames[&1].duration, Duration::from_secs(360));
    assert_eq!(unit.frames[&2].timestamp, at(8, 46, 20));
    assert_eq!(unit.result, WorkUnitResult::Unknown);
}

#[test]
fn partial_lines_wait_for_newline() {
    let mut log = RunLog::new();
    let (head, tail) = LOG.split_at(LOG.find("Project:").unwrap() + 10);
    log.feed(head);
    let project = ProjectInfo::new(7610, 630, 0, 59);
    assert!(log.find_unit(0, 1, project).is_none());

    log.feed(tail);
    assert!(log.find_unit(0, 1, project).is_some());
}

#[test]
fn restart_of_a_unit_prefers_latest_attempt() {
    let mut log = RunLog::new();
    log.feed(LOG);
    log.feed(
        "08:50:00:WU01:FS00:FahCore returned: INTERRUPTED (102 = 0x66)\n\
         08:51:00:WU01:FS00:Starting\n\
         08:51:01:WU01:FS00:0xa8:Project: 7610 (Run 630, Clone 0, Gen 59)\n",
    );

    let unit = log.find_unit(0, 1, ProjectInfo::new(7610, 630, 0, 59)).unwrap();
    assert_eq!(unit.started, Some(at(8, 51, 0)));
    assert_eq!(unit.result, WorkUnitResult::Unknown);
    assert!(unit.frames.is_empty());
    assert_eq!(log.runs()[0].slots[&0].units.len(), 2);
}

#[test]
fn day_rollover_advances_date() {
    let mut log = RunLog::new();
    log.feed(
        "*** Log Started 2020-03-28T23:59:00Z ***\n\
         23:59:30:WU00:FS01:Starting\n\
         23:59:31:WU00:FS01:0x22:Project: 11744 (Run 0, Clone 1, Gen 2)\n\
         00:00:10:WU00:FS01:0x22:Completed 250 out of 25000 steps (1%)\n",
    );
    let unit = log.find_unit(1, 0, ProjectInfo::new(11744, 0, 1, 2)).unwrap();
    assert_eq!(unit.frames[&1].timestamp, Utc.with_ymd_and_hms(2020, 3, 29, 0, 0, 10).unwrap());
}

#[test]
fn unit_lines_before_any_client_run_are_ignored() {
    let mut log = RunLog::new();
    log.feed("08:33:56:WU01:FS00:Starting\n");
    assert!(log.is_empty());
}

#[test]
fn new_client_run_starts_fresh() {
    let mut log = RunLog::new();
    log.feed(LOG);
    log.feed(
        "*** Log Started 2020-03-29T10:00:00Z ***\n\
         10:00:05:WU01:FS00:Starting\n\
         10:00:06:WU01:FS00:0xa8:Project: 7610 (Run 630, Clone 0, Gen 59)\n\
         10:30:00:WU01:FS00:FahCore returned: FINISHED_UNIT (100 = 0x64)\n",
    );
    assert_eq!(log.runs().len(), 2);
    let unit = log.find_unit(0, 1, ProjectInfo::new(7610, 630, 0, 59)).unwrap();
    assert_eq!(unit.result, WorkUnitResult::FinishedUnit);
}
