// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[yare::parameterized(
    utc     = { "2020-03-28T08:33:55Z", Some((2020, 3, 28, 8, 33, 55)) },
    invalid = { "<invalid>", None },
    blank   = { "  ", None },
    garbage = { "yesterday", None },
)]
fn parses_client_times(text: &str, expected: Option<(i32, u32, u32, u32, u32, u32)>) {
    let expected = expected.map(|(y, mo, d, h, mi, s)| Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap());
    assert_eq!(parse_time(text), expected);
}

#[test]
fn info_sections() {
    let info: Info = serde_json::from_str(
        r#"[["FAHClient", ["Version", "7.6.21"], ["Mode", "Release"]],
            ["System", ["CPU", "AMD Ryzen 7"], ["CPUs", 16], ["OS", "Linux"]]]"#,
    )
    .unwrap();
    assert_eq!(info.client_version(), Some("7.6.21"));
    assert_eq!(info.get("System", "OS"), Some("Linux"));
    assert_eq!(info.get("System", "CPUs"), Some("16"));
    assert_eq!(info.get("System", "GPUs"), None);
}

#[test]
fn options_values_are_stringified() {
    let options: Options =
        serde_json::from_str(r#"{"user": "harlam357", "team": 32, "power": "full", "gpu": false}"#)
            .unwrap();
    assert_eq!(options.get("user"), Some("harlam357"));
    assert_eq!(options.get("team"), Some("32"));
    assert_eq!(options.get("gpu"), Some("false"));
}

#[test]
fn slot_info_accepts_string_ids() {
    let slots: Vec<SlotInfo> = serde_json::from_str(
        r#"[{"id": "00", "status": "RUNNING", "description": "cpu:15", "options": {"idle": "false"},
             "reason": "", "idle": false},
            {"id": "01", "status": "PAUSED", "description": "gpu:0:TU106", "options": {}, "reason": "paused", "idle": false}]"#,
    )
    .unwrap();
    assert_eq!(slots[0].id, 0);
    assert_eq!(slots[1].id, 1);
    assert_eq!(slots[1].description, "gpu:0:TU106");
    assert_eq!(slots[0].options.get("idle").map(String::as_str), Some("false"));
}

#[test]
fn slot_options_machine_id() {
    let options: SlotOptions =
        serde_json::from_str(r#"{"machine-id": "1", "client-type": "advanced"}"#).unwrap();
    assert_eq!(options.machine_id(), Some(1));

    let options: SlotOptions = serde_json::from_str(r#"{"client-type": "advanced"}"#).unwrap();
    assert_eq!(options.machine_id(), None);
}

#[test]
fn unit_info_fields() {
    let units: Vec<UnitInfo> = serde_json::from_str(
        r#"[{"id": "01", "state": "RUNNING", "error": "NO_ERROR", "project": 7610, "run": 630,
             "clone": 0, "gen": 59, "core": "0xa8", "unit": "0x0000004b8f59ecd65e7e8e8a1ed2e1e1",
             "percentdone": "3.00%", "totalframes": 100, "framesdone": 3,
             "assigned": "2020-03-28T08:33:55Z", "timeout": "2020-03-29T08:33:55Z",
             "deadline": "<invalid>", "attempts": 0, "slot": "00"}]"#,
    )
    .unwrap();
    let unit = &units[0];
    assert_eq!(unit.id, 1);
    assert_eq!(unit.state, UnitState::Running);
    assert_eq!(unit.project_info(), fw_core::ProjectInfo::new(7610, 630, 0, 59));
    assert_eq!(unit.assigned, Some(Utc.with_ymd_and_hms(2020, 3, 28, 8, 33, 55).unwrap()));
    assert_eq!(unit.deadline, None);
    assert_eq!(unit.slot, 0);
    assert_eq!(unit.framesdone, 3);
}

#[test]
fn unknown_unit_state() {
    let unit: UnitInfo = serde_json::from_str(r#"{"id": "00", "state": "FINISHING"}"#).unwrap();
    assert_eq!(unit.state, UnitState::Unknown);
}
