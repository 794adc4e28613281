// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! foldwatch daemon library
//!
//! Agent registry, task scheduling and the policy that drives them.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod orchestrator;
pub mod preferences;
pub mod registry;
pub mod report;
pub mod scheduler;

pub use config::{Config, ConfigError};
pub use lifecycle::{startup, Daemon, LifecycleError, Paths};
pub use orchestrator::Orchestrator;
pub use preferences::{PreferenceKey, Preferences, ProductionCalculation, TaskPreferences};
pub use registry::{AgentRegistry, ConfigurationAction, ConfigurationChanged, RegistryError};
pub use report::{JsonReport, ReportGenerator};
pub use scheduler::{ScheduledTask, TaskAction, TaskChanged, TaskState};
