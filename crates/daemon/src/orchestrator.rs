// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduling policy for agent refresh and report generation.
//!
//! Registry changes and preference changes arrive on broadcast channels and
//! are turned into calls on two [`ScheduledTask`]s.
//!
//! Freshly published resources ([`ConfigurationAction::Invalidate`]) do not
//! trigger a refresh: they are only published by the refresh task itself.

use crate::preferences::{PreferenceKey, Preferences};
use crate::registry::{AgentRegistry, ConfigurationAction, ConfigurationChanged};
use crate::report::ReportGenerator;
use crate::scheduler::ScheduledTask;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const REFRESH_TASK: &str = "agent refresh";
pub const REPORT_TASK: &str = "report generation";

pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    preferences: Arc<Preferences>,
    refresh: ScheduledTask,
    report: ScheduledTask,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        preferences: Arc<Preferences>,
        reports: Arc<dyn ReportGenerator>,
    ) -> Self {
        let prefs = preferences.get();

        let report = {
            let registry = Arc::clone(&registry);
            ScheduledTask::new(REPORT_TASK, prefs.report_interval(), move |_| {
                let registry = Arc::clone(&registry);
                let reports = Arc::clone(&reports);
                async move { reports.generate(&registry.resources()).await }
            })
        };

        let refresh = {
            let registry = Arc::clone(&registry);
            let preferences = Arc::clone(&preferences);
            let report = report.clone();
            ScheduledTask::new(REFRESH_TASK, prefs.refresh_interval(), move |token: CancellationToken| {
                let registry = Arc::clone(&registry);
                let preferences = Arc::clone(&preferences);
                let report = report.clone();
                async move {
                    registry.refresh_all(&token).await;
                    if !token.is_cancelled() && preferences.get().report_follows_refresh() {
                        report.run(None);
                    }
                    Ok(())
                }
            })
        };

        Self { registry, preferences, refresh, report }
    }

    pub fn refresh_task(&self) -> &ScheduledTask {
        &self.refresh
    }

    pub fn report_task(&self) -> &ScheduledTask {
        &self.report
    }

    /// Apply the policy for one registry change.
    pub fn handle_configuration_changed(&self, change: &ConfigurationChanged) {
        match change.action {
            ConfigurationAction::Add => {
                let prefs = self.preferences.get();
                self.refresh.set_interval(prefs.refresh_interval());
                self.refresh.run(Some(prefs.refresh_enabled));
                if prefs.report_on_interval() {
                    self.report.set_interval(prefs.report_interval());
                    self.report.start();
                }
            }
            ConfigurationAction::Remove | ConfigurationAction::Clear => {
                if self.registry.is_empty() {
                    tracing::info!("no agents configured, stopping tasks");
                    self.refresh.cancel();
                    self.report.cancel();
                }
            }
            ConfigurationAction::Edit | ConfigurationAction::Refresh => self.refresh.run(None),
            // Raised by every refresh; answering it with another refresh would never settle
            ConfigurationAction::Invalidate => {}
        }
    }

    /// Apply the policy for one preference change.
    pub fn handle_preference_changed(&self, key: PreferenceKey) {
        let prefs = self.preferences.get();
        match key {
            PreferenceKey::RefreshEnabled | PreferenceKey::RefreshInterval => {
                self.refresh.set_interval(prefs.refresh_interval());
                if prefs.refresh_enabled {
                    self.refresh.restart();
                } else {
                    self.refresh.stop();
                }
            }
            PreferenceKey::ReportEnabled | PreferenceKey::ReportInterval | PreferenceKey::ReportAfterRefresh => {
                self.report.set_interval(prefs.report_interval());
                if prefs.report_on_interval() {
                    self.report.restart();
                } else {
                    self.report.stop();
                }
            }
            PreferenceKey::ProductionCalculation => self.refresh.run(None),
        }
    }

    /// Follow registry and preference changes until `shutdown` fires.
    pub fn listen(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let mut registry_rx = self.registry.subscribe();
        let mut preferences_rx = self.preferences.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    change = registry_rx.recv() => match change {
                        Ok(change) => {
                            tracing::debug!(action = %change.action, agent = ?change.agent.as_ref().map(|a| &a.name), "configuration changed");
                            this.handle_configuration_changed(&change);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "configuration changes lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    key = preferences_rx.recv() => match key {
                        Ok(key) => this.handle_preference_changed(key),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "preference changes lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    /// Cancel both tasks.
    pub fn shutdown(&self) {
        self.refresh.cancel();
        self.report.cancel();
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
