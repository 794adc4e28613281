// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte buffer that splits the inbound stream into messages and reply lines.

use crate::message::{Message, MessageType};
use chrono::{DateTime, Utc};

const HEADER: &[u8] = b"PyON ";
const TRAILER: &[u8] = b"\n---\n";
const PROMPT: &str = "> ";

#[derive(Debug, Default)]
pub(crate) struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete message, discarding text outside frames.
    pub(crate) fn next_message(&mut self, received: DateTime<Utc>) -> Option<Message> {
        let Some(start) = find(&self.buf, HEADER, 0) else {
            // Keep a possible partial header at the tail.
            let keep = self.buf.len().min(HEADER.len() - 1);
            self.buf.drain(..self.buf.len() - keep);
            return None;
        };
        self.buf.drain(..start);

        let header_end = find(&self.buf, b"\n", 0)?;
        let trailer = find(&self.buf, TRAILER, header_end)?;

        let header = String::from_utf8_lossy(&self.buf[..header_end]).into_owned();
        let body_start = header_end + 1;
        let text = if trailer >= body_start {
            String::from_utf8_lossy(&self.buf[body_start..trailer]).into_owned()
        } else {
            String::new()
        };
        self.buf.drain(..trailer + TRAILER.len());

        // "PyON <version> <type>"
        let tag = header.split_whitespace().nth(2).unwrap_or_default();
        Some(Message { message_type: MessageType::parse(tag), received, text })
    }

    /// Take the next non-empty line, without any leading prompt.
    pub(crate) fn next_line(&mut self) -> Option<String> {
        loop {
            let end = find(&self.buf, b"\n", 0)?;
            let raw: Vec<u8> = self.buf.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\r', '\n']);
            let line = line.strip_prefix(PROMPT).unwrap_or(line).trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..].windows(needle.len()).position(|w| w == needle).map(|p| p + from)
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
