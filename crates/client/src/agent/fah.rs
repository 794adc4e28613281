// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent speaking the v7 command-server protocol.
//!
//! The first refresh connects, authenticates, subscribes to the periodic
//! pushes and spawns a reader loop that feeds the [`Reassembler`]. Every
//! refresh then drains it and publishes fresh [`Resources`].

use super::{Agent, AgentChanged, AgentError, AgentStatus, Resources, SlotResources, CHANGED_CAPACITY};
use crate::connector::Connector;
use crate::payload::SlotInfo;
use crate::reassembler::{AgentSnapshot, Drained, Reassembler};
use crate::work_items::{build_collection, BuildInput};
use async_trait::async_trait;
use fw_core::{AgentSettings, Clock, ProteinService, WorkItem};
use fw_wire::{commands, Connection, Message, MessageType, ProtocolError, Reader};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Protocol settings shared by every [`FahAgent`].
#[derive(Debug, Clone)]
pub struct FahAgentOptions {
    /// Interval of the heartbeat push.
    pub heartbeat_secs: u32,
}

impl Default for FahAgentOptions {
    fn default() -> Self {
        Self { heartbeat_secs: 60 }
    }
}

pub struct FahAgent {
    inner: Arc<Inner>,
}

struct Inner {
    settings: AgentSettings,
    connector: Arc<dyn Connector>,
    proteins: Arc<dyn ProteinService>,
    clock: Arc<dyn Clock>,
    options: FahAgentOptions,
    reassembler: Arc<Reassembler>,
    connection: Mutex<Option<Arc<Connection>>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    refreshing: AtomicBool,
    status: Mutex<AgentStatus>,
    resources: RwLock<Arc<Resources>>,
    /// Current work item of each slot as of the last publish.
    previous: Mutex<HashMap<u32, WorkItem>>,
    changed: broadcast::Sender<AgentChanged>,
}

/// Holds the single-flight refresh flag; releases it on drop.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A connection whose handshake has not finished. Unless completed, it is
/// cancelled and cleared when dropped, including when the connecting future
/// itself is dropped.
struct PendingConnection<'a> {
    agent: &'a Inner,
    connection: Option<Arc<Connection>>,
}

impl<'a> PendingConnection<'a> {
    fn install(agent: &'a Inner, connection: Arc<Connection>) -> Self {
        *agent.connection.lock() = Some(Arc::clone(&connection));
        Self { agent, connection: Some(connection) }
    }

    fn complete(mut self) {
        self.connection = None;
    }
}

impl Drop for PendingConnection<'_> {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        connection.cancel();
        let mut slot = self.agent.connection.lock();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, &connection)) {
            slot.take();
        }
        drop(slot);
        if !self.agent.settings.disabled {
            self.agent.set_status(AgentStatus::Disconnected);
        }
    }
}

impl FahAgent {
    pub fn new(
        settings: AgentSettings,
        connector: Arc<dyn Connector>,
        proteins: Arc<dyn ProteinService>,
        clock: Arc<dyn Clock>,
        options: FahAgentOptions,
    ) -> Self {
        let status = if settings.disabled { AgentStatus::Disabled } else { AgentStatus::Disconnected };
        let (changed, _) = broadcast::channel(CHANGED_CAPACITY);
        let resources = Resources::empty(settings.identity(), status);
        Self {
            inner: Arc::new(Inner {
                settings,
                connector,
                proteins,
                clock,
                options,
                reassembler: Arc::new(Reassembler::new()),
                connection: Mutex::new(None),
                reader_task: Mutex::new(None),
                refreshing: AtomicBool::new(false),
                status: Mutex::new(status),
                resources: RwLock::new(Arc::new(resources)),
                previous: Mutex::new(HashMap::new()),
                changed,
            }),
        }
    }

    pub fn status(&self) -> AgentStatus {
        *self.inner.status.lock()
    }

    /// Snapshot as of the last refresh.
    pub fn snapshot(&self) -> Arc<AgentSnapshot> {
        self.inner.reassembler.snapshot()
    }
}

impl Inner {
    fn is_connected(&self) -> bool {
        self.connection.lock().as_ref().is_some_and(|c| c.is_connected())
    }

    fn set_status(&self, status: AgentStatus) {
        *self.status.lock() = status;
    }

    async fn connect(self: &Arc<Self>) -> Result<(), AgentError> {
        if self.settings.disabled {
            return Err(AgentError::Disabled(self.settings.name.clone()));
        }
        if self.is_connected() {
            return Ok(());
        }
        self.set_status(AgentStatus::Connecting);

        let span = tracing::info_span!(
            "connect",
            agent = %self.settings.name,
            address = %self.settings.identity().address(),
        );
        async {
            let connection = Arc::new(self.connector.connect(&self.settings).await?);
            let pending = PendingConnection::install(self, Arc::clone(&connection));

            if let Some(password) = self.settings.credential() {
                connection.command(commands::auth(password)).execute().await?;
            }
            for command in commands::subscription(self.options.heartbeat_secs) {
                connection.command(command).execute().await?;
            }
            connection.command(commands::QUEUE_INFO).execute().await?;

            if !connection.is_connected() {
                return Err(AgentError::Protocol(ProtocolError::Closed));
            }
            let reader = connection.reader()?;
            let task = tokio::spawn(read_loop(
                reader,
                Arc::clone(&connection),
                Arc::clone(&self.reassembler),
                Arc::downgrade(self),
            ));
            if let Some(previous) = self.reader_task.lock().replace(task) {
                previous.abort();
            }

            pending.complete();
            self.set_status(AgentStatus::Connected);
            tracing::info!("connected");
            Ok::<(), AgentError>(())
        }
        .instrument(span)
        .await
    }

    async fn refresh(self: &Arc<Self>) {
        if self.settings.disabled {
            return;
        }
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            tracing::debug!(agent = %self.settings.name, "refresh already in progress");
            return;
        };

        if !self.is_connected() {
            if let Err(e) = self.connect().await {
                tracing::warn!(agent = %self.settings.name, error = %e, "connect failed");
                self.close().await;
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let Drained { snapshot, messages } = self.reassembler.drain();
        let now = self.clock.now();
        tracing::trace!(agent = %self.settings.name, messages = messages.len(), "publishing resources");

        let mut previous = self.previous.lock();
        let slots: Vec<SlotResources> = snapshot
            .slots
            .iter()
            .map(|slot| SlotResources {
                slot_id: slot.id,
                status: slot.status.clone(),
                description: slot.description.clone(),
                work_items: build_collection(&BuildInput {
                    snapshot: &snapshot,
                    slot_id: slot.id,
                    slot_description: &slot.description,
                    previous: previous.get(&slot.id),
                    now,
                    proteins: self.proteins.as_ref(),
                }),
            })
            .collect();
        *previous = slots
            .iter()
            .filter_map(|s| s.work_items.current().map(|item| (s.slot_id, item.clone())))
            .collect();
        drop(previous);

        let resources = Resources {
            identity: self.settings.identity(),
            status: *self.status.lock(),
            refreshed: Some(now),
            client_version: None,
            slots,
        }
        .with_info(snapshot.info.as_ref());
        *self.resources.write() = Arc::new(resources);
        let _ = self.changed.send(AgentChanged::Resources);
    }

    async fn close(&self) {
        let connection = self.connection.lock().take();
        self.shutdown(connection).await;
    }

    /// Close `ended` only if it is still the agent's connection.
    async fn close_if_current(&self, ended: &Arc<Connection>) {
        let connection = {
            let mut slot = self.connection.lock();
            match slot.as_ref() {
                Some(current) if Arc::ptr_eq(current, ended) => slot.take(),
                _ => None,
            }
        };
        self.shutdown(connection).await;
    }

    async fn shutdown(&self, connection: Option<Arc<Connection>>) {
        if !self.settings.disabled {
            self.set_status(AgentStatus::Disconnected);
        }
        let Some(connection) = connection else {
            return;
        };
        if let Err(e) = connection.close().await {
            tracing::error!(agent = %self.settings.name, error = %e, "error closing connection");
        }
        tracing::info!(agent = %self.settings.name, "disconnected");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.get_mut().take() {
            task.abort();
        }
    }
}

async fn read_loop(
    mut reader: Reader,
    connection: Arc<Connection>,
    reassembler: Arc<Reassembler>,
    agent: Weak<Inner>,
) {
    let peer = connection.peer().to_string();
    let outcome = loop {
        match reader.read().await {
            Ok(true) => {
                if let Some(message) = reader.take_current() {
                    if message.message_type == MessageType::SlotInfo {
                        request_slot_options(&connection, &message).await;
                    }
                    reassembler.enqueue(message);
                }
            }
            Ok(false) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let dropped = match outcome {
        Ok(()) => {
            tracing::info!(%peer, "agent closed the connection");
            true
        }
        Err(e) if e.is_shutdown() => {
            tracing::debug!(%peer, "reader stopped");
            false
        }
        Err(e) => {
            tracing::error!(%peer, error = %e, "reader failed");
            true
        }
    };

    if let Some(agent) = agent.upgrade() {
        agent.close_if_current(&connection).await;
        if dropped {
            let _ = agent.changed.send(AgentChanged::Disconnected);
        }
    }
}

/// Ask for the options of every slot; they come back as `slot-options`.
async fn request_slot_options(connection: &Connection, message: &Message) {
    let Ok(slots) = message.parse::<Vec<SlotInfo>>() else {
        return;
    };
    for slot in slots {
        if let Err(e) = connection.command(commands::slot_options(slot.id)).execute().await {
            tracing::debug!(peer = %connection.peer(), error = %e, "slot-options request failed");
            return;
        }
    }
}

#[async_trait]
impl Agent for FahAgent {
    fn settings(&self) -> &AgentSettings {
        &self.inner.settings
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn resources(&self) -> Arc<Resources> {
        Arc::clone(&self.inner.resources.read())
    }

    fn subscribe(&self) -> broadcast::Receiver<AgentChanged> {
        self.inner.changed.subscribe()
    }

    async fn connect(&self) -> Result<(), AgentError> {
        self.inner.connect().await
    }

    async fn refresh(&self) {
        self.inner.refresh().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

#[cfg(test)]
#[path = "fah_tests.rs"]
mod tests;
