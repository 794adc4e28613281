// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;

#[yare::parameterized(
    heartbeat    = { "heartbeat", MessageType::Heartbeat },
    units        = { "units", MessageType::QueueInfo },
    queue_info   = { "queue-info", MessageType::QueueInfo },
    slots        = { "slots", MessageType::SlotInfo },
    slot_options = { "slot-options", MessageType::SlotOptions },
    log_restart  = { "log-restart", MessageType::LogRestart },
    log_update   = { "log-update", MessageType::LogUpdate },
)]
fn message_type_tags(tag: &str, expected: MessageType) {
    assert_eq!(MessageType::parse(tag), expected);
}

#[test]
fn unknown_tag_is_kept() {
    let ty = MessageType::parse("ppd");
    assert_eq!(ty, MessageType::Other("ppd".into()));
    assert_eq!(ty.as_str(), "ppd");
}

#[test]
fn parse_converts_pyon() {
    #[derive(Deserialize)]
    struct Slot {
        id: String,
        idle: bool,
    }

    let message = Message::new(MessageType::SlotInfo, r#"[{"id": "00", "idle": True}]"#);
    let slots: Vec<Slot> = message.parse().unwrap();
    assert_eq!(slots[0].id, "00");
    assert!(slots[0].idle);
}

#[test]
fn parse_error_names_message_type() {
    let message = Message::new(MessageType::Options, "{not json");
    let err = message.parse::<serde_json::Value>().unwrap_err();
    assert!(err.to_string().contains("options"), "unexpected error: {err}");
}

#[test]
fn log_text_decodes_literal() {
    let message = Message::new(MessageType::LogUpdate, r#""12:00:00:WU00:FS00:Starting\n""#);
    assert_eq!(message.log_text(), "12:00:00:WU00:FS00:Starting\n");
}
