// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{AgentSettings, ProjectInfo};

/// Proptest strategies for identity types.
pub mod strategies {
    use crate::AgentIdentity;
    use proptest::prelude::*;

    pub fn arb_identity() -> impl Strategy<Value = AgentIdentity> {
        ("[a-z]{1,6}", "[a-z]{1,6}", any::<u16>())
            .prop_map(|(name, host, port)| AgentIdentity::new(name, host, port))
    }
}

/// Settings for a local test agent named `name`.
pub fn local_settings(name: &str) -> AgentSettings {
    AgentSettings::new(name, "127.0.0.1", crate::settings::DEFAULT_PORT)
}

/// The project most fixtures in this workspace use.
pub fn p7610() -> ProjectInfo {
    ProjectInfo::new(7610, 630, 0, 59)
}
