// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::connection::ProtocolError;
use crate::pyon;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::fmt;

/// Type tag of a pushed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Heartbeat,
    Info,
    Options,
    SlotInfo,
    SlotOptions,
    QueueInfo,
    LogRestart,
    LogUpdate,
    Other(String),
}

impl MessageType {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "heartbeat" => Self::Heartbeat,
            "info" => Self::Info,
            "options" => Self::Options,
            "slots" | "slot-info" => Self::SlotInfo,
            "slot-options" => Self::SlotOptions,
            "units" | "queue-info" => Self::QueueInfo,
            "log-restart" => Self::LogRestart,
            "log-update" => Self::LogUpdate,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Info => "info",
            Self::Options => "options",
            Self::SlotInfo => "slot-info",
            Self::SlotOptions => "slot-options",
            Self::QueueInfo => "queue-info",
            Self::LogRestart => "log-restart",
            Self::LogUpdate => "log-update",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message pushed by the client, payload still uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_type: MessageType,
    pub received: DateTime<Utc>,
    pub text: String,
}

impl Message {
    pub fn new(message_type: MessageType, text: impl Into<String>) -> Self {
        Self { message_type, received: Utc::now(), text: text.into() }
    }

    /// Deserialize the PyON payload.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_str(&pyon::to_json(&self.text)).map_err(|source| {
            ProtocolError::Payload { message_type: self.message_type.to_string(), source }
        })
    }

    /// Payload of a log message as plain text.
    pub fn log_text(&self) -> String {
        pyon::decode_string(&self.text)
    }

    /// Serialize back to the framed wire form.
    pub fn to_frame(&self) -> String {
        format!("PyON 1 {}\n{}\n---\n", self.message_type, self.text)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
