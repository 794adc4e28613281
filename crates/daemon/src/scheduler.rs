// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic, cancellable task with overlap prevention.
//!
//! A [`ScheduledTask`] owns one body. `run` executes it now; `start` arms an
//! interval timer that runs it later. When a run completes the task re-arms
//! itself if it is still enabled and the run was not canceled.
//!
//! State transitions:
//!
//! ```text
//! Idle|Scheduled --run--> Running --ok--> Finished  --enabled--> Scheduled
//!                                 --err-> Faulted   --disabled-> Idle
//!                                 --cancel-> Canceled
//! ```

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

const CHANGED_CAPACITY: usize = 64;

type TaskBody = Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Scheduled,
    Running,
    Faulted,
    Canceled,
    Finished,
}

fw_core::simple_display! {
    TaskState {
        Idle => "idle",
        Scheduled => "scheduled",
        Running => "running",
        Faulted => "faulted",
        Canceled => "canceled",
        Finished => "finished",
    }
}

/// What a [`TaskChanged`] notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Started,
    Stopped,
    Running,
    AlreadyInProgress,
    Faulted,
    Canceled,
    Finished,
}

fw_core::simple_display! {
    TaskAction {
        Started => "started",
        Stopped => "stopped",
        Running => "running",
        AlreadyInProgress => "already in progress",
        Faulted => "faulted",
        Canceled => "canceled",
        Finished => "finished",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanged {
    pub name: String,
    pub action: TaskAction,
    pub interval: Duration,
    /// Run time, on completion actions.
    pub elapsed: Option<Duration>,
}

/// Cloneable handle to a scheduled task.
#[derive(Clone)]
pub struct ScheduledTask {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    body: TaskBody,
    slot: Mutex<Slot>,
    changed: broadcast::Sender<TaskChanged>,
}

struct Slot {
    interval: Duration,
    enabled: bool,
    state: TaskState,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the timer is disarmed; a timer only fires for its own arming.
    armed: u64,
    run: Option<JoinHandle<()>>,
    token: CancellationToken,
    last_fault: Option<String>,
}

impl Slot {
    fn disarm(&mut self) {
        self.armed = self.armed.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl ScheduledTask {
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, body: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let body: TaskBody = Arc::new(move |token| Box::pin(body(token)));
        let (changed, _) = broadcast::channel(CHANGED_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                body,
                slot: Mutex::new(Slot {
                    interval,
                    enabled: false,
                    state: TaskState::Idle,
                    timer: None,
                    armed: 0,
                    run: None,
                    token: CancellationToken::new(),
                    last_fault: None,
                }),
                changed,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> TaskState {
        self.inner.slot.lock().state
    }

    pub fn enabled(&self) -> bool {
        self.inner.slot.lock().enabled
    }

    pub fn in_progress(&self) -> bool {
        self.state() == TaskState::Running
    }

    /// Error of the most recent faulted run, cleared by a successful one.
    pub fn last_fault(&self) -> Option<String> {
        self.inner.slot.lock().last_fault.clone()
    }

    pub fn interval(&self) -> Duration {
        self.inner.slot.lock().interval
    }

    /// Takes effect the next time the timer is armed.
    pub fn set_interval(&self, interval: Duration) {
        self.inner.slot.lock().interval = interval;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskChanged> {
        self.inner.changed.subscribe()
    }

    /// Run the body now. `Some(enabled)` also sets whether the task re-arms
    /// after this run.
    pub fn run(&self, enabled: Option<bool>) {
        self.inner.run(enabled);
    }

    /// Arm the timer without running now.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Re-arm the timer from now, picking up a changed interval.
    pub fn restart(&self) {
        self.inner.start();
    }

    /// Disarm the timer. A run in flight completes normally.
    pub fn stop(&self) {
        let mut slot = self.inner.slot.lock();
        self.inner.stop(&mut slot);
    }

    /// Signal the running body to stop, then disarm the timer.
    pub fn cancel(&self) {
        let mut slot = self.inner.slot.lock();
        slot.token.cancel();
        self.inner.stop(&mut slot);
    }
}

impl Inner {
    fn emit(&self, slot: &Slot, action: TaskAction, elapsed: Option<Duration>) {
        let _ = self.changed.send(TaskChanged {
            name: self.name.clone(),
            action,
            interval: slot.interval,
            elapsed,
        });
    }

    fn run(self: &Arc<Self>, enabled: Option<bool>) {
        let mut slot = self.slot.lock();
        self.run_locked(&mut slot, enabled);
    }

    fn run_locked(self: &Arc<Self>, slot: &mut Slot, enabled: Option<bool>) {
        if slot.state == TaskState::Running {
            tracing::debug!(task = %self.name, "run already in progress");
            self.emit(slot, TaskAction::AlreadyInProgress, None);
            return;
        }
        if let Some(enabled) = enabled {
            slot.enabled = enabled;
        }
        slot.disarm();
        slot.state = TaskState::Running;
        slot.token = CancellationToken::new();
        self.emit(slot, TaskAction::Running, None);

        let token = slot.token.clone();
        let body = tokio::spawn((self.body)(token.clone()));
        let task = Arc::downgrade(self);
        slot.run = Some(tokio::spawn(async move {
            let started = Instant::now();
            let outcome = body.await;
            if let Some(task) = task.upgrade() {
                task.complete(outcome, &token, started.elapsed());
            }
        }));
    }

    fn complete(
        self: &Arc<Self>,
        outcome: Result<anyhow::Result<()>, JoinError>,
        token: &CancellationToken,
        elapsed: Duration,
    ) {
        let mut slot = self.slot.lock();
        slot.run = None;

        let action = if token.is_cancelled() {
            TaskAction::Canceled
        } else {
            match outcome {
                Ok(Ok(())) => {
                    slot.last_fault = None;
                    TaskAction::Finished
                }
                Ok(Err(e)) => {
                    tracing::error!(task = %self.name, error = %e, "task faulted");
                    slot.last_fault = Some(format!("{e:#}"));
                    TaskAction::Faulted
                }
                Err(e) => {
                    tracing::error!(task = %self.name, error = %e, "task panicked");
                    slot.last_fault = Some(e.to_string());
                    TaskAction::Faulted
                }
            }
        };
        slot.state = match action {
            TaskAction::Canceled => TaskState::Canceled,
            TaskAction::Faulted => TaskState::Faulted,
            _ => TaskState::Finished,
        };
        tracing::debug!(task = %self.name, %action, ?elapsed, "task completed");
        self.emit(&slot, action, Some(elapsed));

        if action != TaskAction::Canceled {
            if slot.enabled {
                self.arm(&mut slot);
            } else {
                slot.state = TaskState::Idle;
            }
        }
    }

    fn start(self: &Arc<Self>) {
        let mut slot = self.slot.lock();
        if slot.state == TaskState::Running {
            self.emit(&slot, TaskAction::AlreadyInProgress, None);
            return;
        }
        slot.enabled = true;
        self.arm(&mut slot);
        self.emit(&slot, TaskAction::Started, None);
    }

    fn stop(&self, slot: &mut Slot) {
        slot.enabled = false;
        slot.disarm();
        if slot.state != TaskState::Running {
            slot.state = TaskState::Idle;
        }
        self.emit(slot, TaskAction::Stopped, None);
    }

    fn arm(self: &Arc<Self>, slot: &mut Slot) {
        slot.disarm();
        let task: Weak<Inner> = Arc::downgrade(self);
        let interval = slot.interval;
        let armed = slot.armed;
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(task) = task.upgrade() {
                task.fire(armed);
            }
        }));
        slot.state = TaskState::Scheduled;
    }

    /// Timer expiry. Ignored when the task was stopped, re-armed or run
    /// since this timer was armed. The timer handle is the running task
    /// itself, so it is forgotten rather than aborted.
    fn fire(self: &Arc<Self>, armed: u64) {
        let mut slot = self.slot.lock();
        if !slot.enabled || slot.armed != armed {
            tracing::trace!(task = %self.name, "stale timer ignored");
            return;
        }
        drop(slot.timer.take());
        self.run_locked(&mut slot, None);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = self.slot.get_mut();
        slot.token.cancel();
        slot.disarm();
        if let Some(run) = slot.run.take() {
            run.abort();
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
