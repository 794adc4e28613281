// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-server protocol of a v7 client.
//!
//! Commands are single text lines. The server pushes framed messages:
//! `PyON <version> <type>\n<payload>\n---\n`, where the payload is Python
//! literal notation.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod commands;
mod connection;
mod frame;
mod message;
pub mod pyon;

pub use connection::{Command, Connection, ProtocolError, Reader};
pub use message::{Message, MessageType};
