// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, one-shot runs, shutdown.

mod startup;
pub use startup::startup;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::orchestrator::Orchestrator;
use crate::preferences::Preferences;
use crate::registry::AgentRegistry;
use crate::report::ReportGenerator;

/// Filesystem locations used by the daemon.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root state directory (e.g. ~/.local/state/foldwatch)
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub log_dir: PathBuf,
    /// JSON report written by the report task
    pub report_path: PathBuf,
}

impl Paths {
    /// Resolve paths from the environment. `config` overrides both
    /// `FW_CONFIG` and the default under the state directory.
    pub fn load(config: Option<PathBuf>) -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        let config = config.or_else(crate::env::config_path);
        Ok(Self::under(state_dir, config))
    }

    pub fn under(state_dir: PathBuf, config: Option<PathBuf>) -> Self {
        Self {
            config_path: config.unwrap_or_else(|| state_dir.join("config.toml")),
            log_dir: state_dir.join("logs"),
            report_path: state_dir.join("reports").join("resources.json"),
            state_dir,
        }
    }
}

/// Running daemon.
pub struct Daemon {
    pub paths: Paths,
    pub registry: Arc<AgentRegistry>,
    pub preferences: Arc<Preferences>,
    pub orchestrator: Arc<Orchestrator>,
    reports: Arc<dyn ReportGenerator>,
    shutdown: CancellationToken,
    /// Orchestrator listener; `None` in one-shot mode
    listener: Option<JoinHandle<()>>,
    start_time: Instant,
}

impl Daemon {
    /// Refresh every agent once and write one report.
    pub async fn run_once(&self) -> Result<(), LifecycleError> {
        self.registry.refresh_all(&self.shutdown).await;
        self.reports
            .generate(&self.registry.resources())
            .await
            .map_err(|e| LifecycleError::Report(format!("{e:#}")))
    }

    /// Stop both tasks and close every agent.
    pub async fn shutdown(self) {
        info!("Shutting down daemon...");
        self.shutdown.cancel();
        self.orchestrator.shutdown();
        self.registry.clear().await;
        if let Some(listener) = self.listener {
            if let Err(e) = listener.await {
                warn!(error = %e, "orchestrator listener failed");
            }
        }
        info!(uptime_secs = self.start_time.elapsed().as_secs(), "Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Report error: {0}")]
    Report(String),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
