// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fw-client: per-agent state reconstruction and refresh lifecycle

pub mod agent;
pub mod connector;
pub mod log;
pub mod payload;
pub mod reassembler;
pub mod work_items;

pub use agent::{
    Agent, AgentChanged, AgentError, AgentFactory, AgentStatus, DefaultAgentFactory, FahAgent,
    FahAgentOptions, NullAgent, Resources, SlotResources,
};
#[cfg(any(test, feature = "test-support"))]
pub use agent::{FakeAgent, FakeAgentFactory};
#[cfg(any(test, feature = "test-support"))]
pub use connector::DuplexConnector;
pub use connector::{Connector, TcpConnector, CONNECT_TIMEOUT};
pub use reassembler::{AgentSnapshot, Drained, Reassembler, LOG_BUFFER_THRESHOLD};
pub use work_items::{build_collection, BuildInput};
