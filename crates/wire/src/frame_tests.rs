// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn now() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[test]
fn splits_framed_message_and_skips_greeting() {
    let mut frames = FrameBuffer::default();
    frames.extend(b"Welcome to the Folding@home Client command server.\n> PyON 1 units\n[]\n---\n> ");

    let message = frames.next_message(now()).unwrap();
    assert_eq!(message.message_type, MessageType::QueueInfo);
    assert_eq!(message.text, "[]");
    assert!(frames.next_message(now()).is_none());
}

#[test]
fn waits_for_trailer_across_chunks() {
    let mut frames = FrameBuffer::default();
    frames.extend(b"PyON 1 options\n{\"user\": ");
    assert!(frames.next_message(now()).is_none());

    frames.extend(b"\"anon\"}\n---");
    assert!(frames.next_message(now()).is_none());

    frames.extend(b"\n");
    let message = frames.next_message(now()).unwrap();
    assert_eq!(message.message_type, MessageType::Options);
    assert_eq!(message.text, "{\"user\": \"anon\"}");
}

#[test]
fn header_split_across_chunks_is_kept() {
    let mut frames = FrameBuffer::default();
    frames.extend(b"> PyO");
    assert!(frames.next_message(now()).is_none());
    frames.extend(b"N 1 heartbeat\n0\n---\n");
    assert_eq!(frames.next_message(now()).unwrap().message_type, MessageType::Heartbeat);
}

#[test]
fn empty_payload() {
    let mut frames = FrameBuffer::default();
    frames.extend(b"PyON 1 heartbeat\n---\n");
    let message = frames.next_message(now()).unwrap();
    assert_eq!(message.text, "");
}

#[test]
fn multiple_messages_in_one_chunk() {
    let mut frames = FrameBuffer::default();
    frames.extend(b"PyON 1 heartbeat\n1\n---\nPyON 1 slots\n[]\n---\n");
    assert_eq!(frames.next_message(now()).unwrap().message_type, MessageType::Heartbeat);
    assert_eq!(frames.next_message(now()).unwrap().message_type, MessageType::SlotInfo);
    assert!(frames.next_message(now()).is_none());
}

#[test]
fn next_line_strips_prompt() {
    let mut frames = FrameBuffer::default();
    frames.extend(b"\n> OK\r\nrest");
    assert_eq!(frames.next_line().as_deref(), Some("OK"));
    assert_eq!(frames.next_line(), None);
}
