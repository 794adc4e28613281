// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of configured agents.
//!
//! The map is an immutable `Arc<HashMap>` replaced wholesale on every
//! mutation, so enumeration is a point-in-time copy. Mutations are serialized
//! by an async mutex because tearing an agent down awaits its close.

use fw_client::{Agent, AgentChanged, AgentFactory, Resources};
use fw_core::{AgentIdentity, AgentSettings};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

const CHANGED_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid settings for agent '{0}'")]
    InvalidSettings(String),
    #[error("agent '{0}' is already configured")]
    Duplicate(String),
    #[error("agent '{0}' not found")]
    NotFound(String),
}

/// Kind of registry change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationAction {
    Add,
    Edit,
    Remove,
    Clear,
    /// An agent published new resources.
    Invalidate,
    /// An agent lost its connection and wants a refresh.
    Refresh,
}

fw_core::simple_display! {
    ConfigurationAction {
        Add => "add",
        Edit => "edit",
        Remove => "remove",
        Clear => "clear",
        Invalidate => "invalidate",
        Refresh => "refresh",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationChanged {
    pub action: ConfigurationAction,
    /// Agent concerned; `None` for aggregate changes.
    pub agent: Option<AgentIdentity>,
}

impl ConfigurationChanged {
    fn new(action: ConfigurationAction, agent: Option<AgentIdentity>) -> Self {
        Self { action, agent }
    }
}

struct Entry {
    agent: Arc<dyn Agent>,
    forwarder: AbortHandle,
}

type AgentMap = HashMap<String, Arc<Entry>>;

pub struct AgentRegistry {
    factory: Arc<dyn AgentFactory>,
    agents: RwLock<Arc<AgentMap>>,
    mutation: tokio::sync::Mutex<()>,
    dirty: AtomicBool,
    changed: broadcast::Sender<ConfigurationChanged>,
}

impl AgentRegistry {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        let (changed, _) = broadcast::channel(CHANGED_CAPACITY);
        Self {
            factory,
            agents: RwLock::new(Arc::new(HashMap::new())),
            mutation: tokio::sync::Mutex::new(()),
            dirty: AtomicBool::new(false),
            changed,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigurationChanged> {
        self.changed.subscribe()
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Whether the registry changed since the last load, clear or
    /// [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn mark_clean(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Agent>> {
        self.current().get(key).map(|e| Arc::clone(&e.agent))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.current().contains_key(key)
    }

    /// Point-in-time list of agents, ordered by identity.
    pub fn agents(&self) -> Vec<Arc<dyn Agent>> {
        let mut agents: Vec<_> = self.current().values().map(|e| Arc::clone(&e.agent)).collect();
        agents.sort_by_cached_key(|a| a.identity());
        agents
    }

    /// Latest published resources of every agent, ordered by identity.
    pub fn resources(&self) -> Vec<Arc<Resources>> {
        self.agents().iter().map(|a| a.resources()).collect()
    }

    /// Replace every agent. Settings the factory refuses are skipped.
    /// Returns the number of agents loaded.
    pub async fn load(&self, settings: impl IntoIterator<Item = AgentSettings>) -> usize {
        let _guard = self.mutation.lock().await;
        let mut map = AgentMap::new();
        for settings in settings {
            let key = settings.key();
            if map.contains_key(&key) {
                tracing::warn!(agent = %settings.name, "duplicate agent skipped");
                continue;
            }
            match self.factory.create(&settings) {
                Some(agent) => {
                    map.insert(key, self.wrap(agent));
                }
                None => tracing::warn!(agent = %settings.name, "agent settings refused"),
            }
        }
        let loaded = map.len();
        let old = self.swap(map);
        self.dirty.store(false, Ordering::SeqCst);
        tracing::info!(agents = loaded, "agents loaded");
        if loaded > 0 {
            self.emit(ConfigurationAction::Add, None);
        }
        teardown_all(&old).await;
        loaded
    }

    pub async fn add(&self, settings: &AgentSettings) -> Result<(), RegistryError> {
        let _guard = self.mutation.lock().await;
        let key = settings.key();
        if self.contains(&key) {
            return Err(RegistryError::Duplicate(settings.name.clone()));
        }
        let agent = self
            .factory
            .create(settings)
            .ok_or_else(|| RegistryError::InvalidSettings(settings.name.clone()))?;

        let mut map = (*self.current()).clone();
        map.insert(key, self.wrap(agent));
        self.swap(map);
        self.dirty.store(true, Ordering::SeqCst);
        tracing::info!(agent = %settings.name, "agent added");
        self.emit(ConfigurationAction::Add, Some(settings.identity()));
        Ok(())
    }

    /// Replace the agent stored under `key` with one built from `settings`.
    /// The new agent is stored under its own key.
    pub async fn edit(&self, key: &str, settings: &AgentSettings) -> Result<(), RegistryError> {
        let _guard = self.mutation.lock().await;
        let current = self.current();
        let old = current.get(key).cloned().ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        let new_key = settings.key();
        if new_key != key && current.contains_key(&new_key) {
            return Err(RegistryError::Duplicate(settings.name.clone()));
        }
        let agent = self
            .factory
            .create(settings)
            .ok_or_else(|| RegistryError::InvalidSettings(settings.name.clone()))?;

        teardown(&old).await;
        let mut map = (*current).clone();
        map.remove(key);
        map.insert(new_key, self.wrap(agent));
        self.swap(map);
        self.dirty.store(true, Ordering::SeqCst);
        tracing::info!(agent = %settings.name, "agent edited");
        self.emit(ConfigurationAction::Edit, Some(settings.identity()));
        Ok(())
    }

    /// Remove and close the agent stored under `key`. Returns whether one was.
    pub async fn remove(&self, key: &str) -> bool {
        let _guard = self.mutation.lock().await;
        let mut map = (*self.current()).clone();
        let Some(old) = map.remove(key) else {
            return false;
        };
        self.swap(map);
        teardown(&old).await;
        self.dirty.store(true, Ordering::SeqCst);
        let identity = old.agent.identity();
        tracing::info!(agent = %identity, "agent removed");
        self.emit(ConfigurationAction::Remove, Some(identity));
        true
    }

    /// Remove and close every agent.
    pub async fn clear(&self) {
        let _guard = self.mutation.lock().await;
        let old = self.swap(AgentMap::new());
        self.dirty.store(false, Ordering::SeqCst);
        if old.is_empty() {
            return;
        }
        teardown_all(&old).await;
        tracing::info!(agents = old.len(), "agents cleared");
        self.emit(ConfigurationAction::Clear, None);
    }

    /// Refresh every agent in parallel. Returns early when `cancel` fires;
    /// refreshes already started are dropped at their next await point.
    pub async fn refresh_all(&self, cancel: &CancellationToken) {
        let agents = self.agents();
        if agents.is_empty() {
            return;
        }
        let refreshes = futures_util::future::join_all(agents.iter().map(|a| a.refresh()));
        tokio::select! {
            _ = refreshes => tracing::debug!(agents = agents.len(), "agents refreshed"),
            _ = cancel.cancelled() => tracing::debug!("refresh canceled"),
        }
    }

    fn current(&self) -> Arc<AgentMap> {
        Arc::clone(&self.agents.read())
    }

    fn swap(&self, map: AgentMap) -> Arc<AgentMap> {
        std::mem::replace(&mut *self.agents.write(), Arc::new(map))
    }

    fn emit(&self, action: ConfigurationAction, agent: Option<AgentIdentity>) {
        let _ = self.changed.send(ConfigurationChanged::new(action, agent));
    }

    /// Subscribe to the agent before it becomes visible so no change is lost.
    fn wrap(&self, agent: Arc<dyn Agent>) -> Arc<Entry> {
        let mut rx = agent.subscribe();
        let changed = self.changed.clone();
        let identity = agent.identity();
        let forwarder = tokio::spawn(async move {
            loop {
                let action = match rx.recv().await {
                    Ok(AgentChanged::Resources) => ConfigurationAction::Invalidate,
                    Ok(AgentChanged::Disconnected) => ConfigurationAction::Refresh,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(agent = %identity, skipped, "agent changes lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let _ = changed.send(ConfigurationChanged::new(action, Some(identity.clone())));
            }
        })
        .abort_handle();
        Arc::new(Entry { agent, forwarder })
    }
}

async fn teardown(entry: &Entry) {
    entry.forwarder.abort();
    entry.agent.close().await;
}

async fn teardown_all(map: &AgentMap) {
    futures_util::future::join_all(map.values().map(|e| teardown(e))).await;
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
