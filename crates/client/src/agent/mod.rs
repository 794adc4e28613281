// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitored agents.
//!
//! Every variant implements [`Agent`]; the registry only sees the trait.

mod fah;
mod null;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use fah::{FahAgent, FahAgentOptions};
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgent, FakeAgentFactory};
pub use null::NullAgent;

use crate::connector::Connector;
use crate::payload::Info;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fw_core::{AgentIdentity, AgentKind, AgentSettings, Clock, ProteinService, WorkItemCollection};
use fw_wire::ProtocolError;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of each agent's change channel.
pub(crate) const CHANGED_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("agent {0} is disabled")]
    Disabled(String),
}

/// Connection state of an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disabled,
}

fw_core::simple_display! {
    AgentStatus {
        Disconnected => "disconnected",
        Connecting => "connecting",
        Connected => "connected",
        Disabled => "disabled",
    }
}

/// Notification raised by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentChanged {
    /// New resources were published.
    Resources,
    /// The connection dropped on its own.
    Disconnected,
}

/// Work items of one slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlotResources {
    pub slot_id: u32,
    pub status: String,
    pub description: String,
    pub work_items: WorkItemCollection,
}

/// Everything published by one refresh. Replaced, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resources {
    pub identity: AgentIdentity,
    pub status: AgentStatus,
    pub refreshed: Option<DateTime<Utc>>,
    pub client_version: Option<String>,
    pub slots: Vec<SlotResources>,
}

impl Resources {
    pub fn empty(identity: AgentIdentity, status: AgentStatus) -> Self {
        Self { identity, status, refreshed: None, client_version: None, slots: Vec::new() }
    }

    pub(crate) fn with_info(mut self, info: Option<&Info>) -> Self {
        self.client_version = info.and_then(Info::client_version).map(str::to_string);
        self
    }
}

/// A monitored agent.
#[async_trait]
pub trait Agent: Send + Sync {
    fn settings(&self) -> &AgentSettings;

    fn identity(&self) -> AgentIdentity {
        self.settings().identity()
    }

    fn is_connected(&self) -> bool;

    /// Latest published resources.
    fn resources(&self) -> Arc<Resources>;

    fn subscribe(&self) -> broadcast::Receiver<AgentChanged>;

    /// Connect and subscribe if not already connected.
    async fn connect(&self) -> Result<(), AgentError>;

    /// Bring published resources up to date. Never fails; problems are
    /// logged and show up as status.
    async fn refresh(&self);

    /// Drop the connection. Idempotent.
    async fn close(&self);
}

/// Creates agents for settings; `None` for settings it cannot serve.
pub trait AgentFactory: Send + Sync {
    fn create(&self, settings: &AgentSettings) -> Option<Arc<dyn Agent>>;
}

/// Production factory: [`FahAgent`] for enabled entries, [`NullAgent`] for
/// disabled ones.
pub struct DefaultAgentFactory {
    connector: Arc<dyn Connector>,
    proteins: Arc<dyn ProteinService>,
    clock: Arc<dyn Clock>,
    options: FahAgentOptions,
}

impl DefaultAgentFactory {
    pub fn new(
        connector: Arc<dyn Connector>,
        proteins: Arc<dyn ProteinService>,
        clock: Arc<dyn Clock>,
        options: FahAgentOptions,
    ) -> Self {
        Self { connector, proteins, clock, options }
    }
}

impl AgentFactory for DefaultAgentFactory {
    fn create(&self, settings: &AgentSettings) -> Option<Arc<dyn Agent>> {
        if let Err(e) = settings.validate() {
            tracing::warn!(agent = %settings.name, error = %e, "invalid agent settings");
            return None;
        }
        match settings.kind {
            AgentKind::Fah if settings.disabled => Some(Arc::new(NullAgent::new(settings.clone()))),
            AgentKind::Fah => Some(Arc::new(FahAgent::new(
                settings.clone(),
                Arc::clone(&self.connector),
                Arc::clone(&self.proteins),
                Arc::clone(&self.clock),
                self.options.clone(),
            ))),
            AgentKind::Unknown => {
                tracing::warn!(agent = %settings.name, "unknown agent kind");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
