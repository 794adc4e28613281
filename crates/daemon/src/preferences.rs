// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task preferences and their change notifications.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

const CHANGED_CAPACITY: usize = 32;

/// How production rates are derived from frame times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionCalculation {
    #[default]
    LastFrame,
    LastThreeFrames,
    AllFrames,
    EffectiveRate,
}

fw_core::simple_display! {
    ProductionCalculation {
        LastFrame => "last_frame",
        LastThreeFrames => "last_three_frames",
        AllFrames => "all_frames",
        EffectiveRate => "effective_rate",
    }
}

/// Settings that drive the scheduled tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPreferences {
    pub refresh_enabled: bool,
    pub refresh_interval_minutes: u32,
    pub report_enabled: bool,
    pub report_interval_minutes: u32,
    /// Generate reports after each refresh instead of on their own interval.
    pub report_after_refresh: bool,
    pub production_calculation: ProductionCalculation,
    pub heartbeat_secs: u32,
    pub connect_timeout_secs: u32,
}

impl Default for TaskPreferences {
    fn default() -> Self {
        Self {
            refresh_enabled: true,
            refresh_interval_minutes: 5,
            report_enabled: false,
            report_interval_minutes: 15,
            report_after_refresh: true,
            production_calculation: ProductionCalculation::default(),
            heartbeat_secs: 60,
            connect_timeout_secs: 5,
        }
    }
}

impl TaskPreferences {
    pub fn refresh_interval(&self) -> Duration {
        minutes(self.refresh_interval_minutes)
    }

    pub fn report_interval(&self) -> Duration {
        minutes(self.report_interval_minutes)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs.max(1)))
    }

    /// Report generation runs on its own timer.
    pub fn report_on_interval(&self) -> bool {
        self.report_enabled && !self.report_after_refresh
    }

    /// Report generation follows each refresh.
    pub fn report_follows_refresh(&self) -> bool {
        self.report_enabled && self.report_after_refresh
    }

    fn changed_keys(&self, other: &Self) -> Vec<PreferenceKey> {
        let mut keys = Vec::new();
        if self.refresh_enabled != other.refresh_enabled {
            keys.push(PreferenceKey::RefreshEnabled);
        }
        if self.refresh_interval_minutes != other.refresh_interval_minutes {
            keys.push(PreferenceKey::RefreshInterval);
        }
        if self.report_enabled != other.report_enabled {
            keys.push(PreferenceKey::ReportEnabled);
        }
        if self.report_interval_minutes != other.report_interval_minutes {
            keys.push(PreferenceKey::ReportInterval);
        }
        if self.report_after_refresh != other.report_after_refresh {
            keys.push(PreferenceKey::ReportAfterRefresh);
        }
        if self.production_calculation != other.production_calculation {
            keys.push(PreferenceKey::ProductionCalculation);
        }
        keys
    }
}

fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value.max(1)) * 60)
}

/// Preference that changed. Heartbeat and connect timeout apply to new
/// connections only and raise nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    RefreshEnabled,
    RefreshInterval,
    ReportEnabled,
    ReportInterval,
    ReportAfterRefresh,
    ProductionCalculation,
}

fw_core::simple_display! {
    PreferenceKey {
        RefreshEnabled => "refresh_enabled",
        RefreshInterval => "refresh_interval",
        ReportEnabled => "report_enabled",
        ReportInterval => "report_interval",
        ReportAfterRefresh => "report_after_refresh",
        ProductionCalculation => "production_calculation",
    }
}

/// Shared preference source.
pub struct Preferences {
    current: RwLock<TaskPreferences>,
    changed: broadcast::Sender<PreferenceKey>,
}

impl Preferences {
    pub fn new(initial: TaskPreferences) -> Self {
        let (changed, _) = broadcast::channel(CHANGED_CAPACITY);
        Self { current: RwLock::new(initial), changed }
    }

    pub fn get(&self) -> TaskPreferences {
        self.current.read().clone()
    }

    /// Apply `f` and announce each changed key. Returns the keys.
    pub fn update(&self, f: impl FnOnce(&mut TaskPreferences)) -> Vec<PreferenceKey> {
        let keys = {
            let mut current = self.current.write();
            let before = current.clone();
            f(&mut current);
            before.changed_keys(&current)
        };
        for key in &keys {
            tracing::debug!(%key, "preference changed");
            let _ = self.changed.send(*key);
        }
        keys
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceKey> {
        self.changed.subscribe()
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(TaskPreferences::default())
    }
}

#[cfg(test)]
#[path = "preferences_tests.rs"]
mod tests;
