// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Agent, AgentChanged, AgentError, AgentStatus, Resources, CHANGED_CAPACITY};
use async_trait::async_trait;
use fw_core::AgentSettings;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Inert agent for disabled entries: never connects, publishes nothing.
pub struct NullAgent {
    settings: AgentSettings,
    resources: Arc<Resources>,
    changed: broadcast::Sender<AgentChanged>,
}

impl NullAgent {
    pub fn new(settings: AgentSettings) -> Self {
        let resources = Arc::new(Resources::empty(settings.identity(), AgentStatus::Disabled));
        let (changed, _) = broadcast::channel(CHANGED_CAPACITY);
        Self { settings, resources, changed }
    }
}

#[async_trait]
impl Agent for NullAgent {
    fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn resources(&self) -> Arc<Resources> {
        Arc::clone(&self.resources)
    }

    fn subscribe(&self) -> broadcast::Receiver<AgentChanged> {
        self.changed.subscribe()
    }

    async fn connect(&self) -> Result<(), AgentError> {
        Err(AgentError::Disabled(self.settings.name.clone()))
    }

    async fn refresh(&self) {}

    async fn close(&self) {}
}
