// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command lines understood by the client's command server.

pub const QUEUE_INFO: &str = "queue-info";
pub const UPDATES_CLEAR: &str = "updates clear";
pub const LOG_RESTART: &str = "log-updates restart";

pub fn auth(password: &str) -> String {
    format!("auth {password}")
}

/// Commands that subscribe to the periodic pushes, in the order they are sent.
///
/// The heartbeat id is 0, then info, options, and slot-info at one second.
pub fn subscription(heartbeat_secs: u32) -> Vec<String> {
    vec![
        UPDATES_CLEAR.to_string(),
        LOG_RESTART.to_string(),
        format!("updates add 0 {heartbeat_secs} $heartbeat"),
        "updates add 1 1 $info".to_string(),
        "updates add 2 1 $(options -a)".to_string(),
        "updates add 3 1 $slot-info".to_string(),
    ]
}

/// Request the options of one slot.
pub fn slot_options(slot_id: u32) -> String {
    format!("slot-options {slot_id:02} -a")
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
