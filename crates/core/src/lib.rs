// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fw-core: domain types shared by the foldwatch crates

pub mod macros;

pub mod clock;
pub mod identity;
pub mod protein;
pub mod settings;
pub mod work_item;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use identity::{AgentId, AgentIdentity};
pub use protein::{Protein, ProteinService, ProteinTable};
pub use settings::{AgentKind, AgentSettings, SettingsError, DEFAULT_PORT};
#[cfg(any(test, feature = "test-support"))]
pub use work_item::WorkItemBuilder;
pub use work_item::{Frame, ProjectInfo, WorkItem, WorkItemCollection, WorkUnitResult};
