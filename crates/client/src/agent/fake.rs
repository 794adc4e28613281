// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording agent for tests.

use super::{Agent, AgentChanged, AgentError, AgentFactory, AgentStatus, Resources, CHANGED_CAPACITY};
use async_trait::async_trait;
use fw_core::AgentSettings;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Agent that records calls and emits changes on demand.
pub struct FakeAgent {
    settings: AgentSettings,
    connected: AtomicBool,
    refreshes: AtomicUsize,
    closes: AtomicUsize,
    refresh_delay: Mutex<Duration>,
    resources: Mutex<Arc<Resources>>,
    changed: broadcast::Sender<AgentChanged>,
}

impl FakeAgent {
    pub fn new(settings: AgentSettings) -> Self {
        let resources = Arc::new(Resources::empty(settings.identity(), AgentStatus::Disconnected));
        let (changed, _) = broadcast::channel(CHANGED_CAPACITY);
        Self {
            settings,
            connected: AtomicBool::new(false),
            refreshes: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            refresh_delay: Mutex::new(Duration::ZERO),
            resources: Mutex::new(resources),
            changed,
        }
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Make each refresh take this long.
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock() = delay;
    }

    /// Raise a change notification as if the agent had produced it.
    pub fn emit(&self, change: AgentChanged) {
        let _ = self.changed.send(change);
    }
}

#[async_trait]
impl Agent for FakeAgent {
    fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn resources(&self) -> Arc<Resources> {
        Arc::clone(&self.resources.lock())
    }

    fn subscribe(&self) -> broadcast::Receiver<AgentChanged> {
        self.changed.subscribe()
    }

    async fn connect(&self) -> Result<(), AgentError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.connected.store(true, Ordering::SeqCst);
        let mut resources = Resources::empty(self.settings.identity(), AgentStatus::Connected);
        resources.refreshed = Some(chrono::Utc::now());
        *self.resources.lock() = Arc::new(resources);
        let _ = self.changed.send(AgentChanged::Resources);
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Factory handing out [`FakeAgent`]s and remembering them by key.
#[derive(Default)]
pub struct FakeAgentFactory {
    agents: Mutex<HashMap<String, Vec<Arc<FakeAgent>>>>,
    reject: Mutex<Vec<String>>,
}

impl FakeAgentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `None` for settings with this name.
    pub fn reject(&self, name: &str) {
        self.reject.lock().push(name.to_string());
    }

    /// Most recent agent created for `key`.
    pub fn agent(&self, key: &str) -> Option<Arc<FakeAgent>> {
        self.agents.lock().get(key).and_then(|v| v.last().cloned())
    }

    /// Every agent created for `key`, oldest first.
    pub fn history(&self, key: &str) -> Vec<Arc<FakeAgent>> {
        self.agents.lock().get(key).cloned().unwrap_or_default()
    }

    pub fn created(&self) -> usize {
        self.agents.lock().values().map(Vec::len).sum()
    }
}

impl AgentFactory for FakeAgentFactory {
    fn create(&self, settings: &AgentSettings) -> Option<Arc<dyn Agent>> {
        if settings.validate().is_err() || self.reject.lock().contains(&settings.name) {
            return None;
        }
        let agent = Arc::new(FakeAgent::new(settings.clone()));
        self.agents.lock().entry(settings.key()).or_default().push(Arc::clone(&agent));
        Some(agent)
    }
}
