// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client run log, replayed from `log-restart`/`log-update` text.

mod line;
mod run_log;

pub use run_log::{ClientRun, RunLog, SlotRun, UnitRun};
