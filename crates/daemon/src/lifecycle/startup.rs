// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and wiring.

use std::sync::Arc;
use std::time::Instant;

use fw_client::{AgentFactory, DefaultAgentFactory, FahAgentOptions, TcpConnector};
use fw_core::{ProteinTable, SystemClock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::preferences::Preferences;
use crate::registry::AgentRegistry;
use crate::report::{JsonReport, ReportGenerator};

use super::{Daemon, LifecycleError, Paths};

/// Build the daemon from `config` and load its agents.
///
/// With `schedule` the orchestrator follows registry and preference changes,
/// so loading the agents starts the refresh task. Without it nothing runs
/// until [`Daemon::run_once`].
pub async fn startup(config: Config, paths: Paths, schedule: bool) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&paths.state_dir)?;

    let prefs = config.preferences;
    let proteins: ProteinTable = config.proteins.into_iter().collect();
    let factory: Arc<dyn AgentFactory> = Arc::new(DefaultAgentFactory::new(
        Arc::new(TcpConnector::new(prefs.connect_timeout())),
        Arc::new(proteins),
        Arc::new(SystemClock),
        FahAgentOptions { heartbeat_secs: prefs.heartbeat_secs },
    ));
    let registry = Arc::new(AgentRegistry::new(factory));
    let preferences = Arc::new(Preferences::new(prefs));
    let reports: Arc<dyn ReportGenerator> = Arc::new(JsonReport::new(paths.report_path.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&registry),
        Arc::clone(&preferences),
        Arc::clone(&reports),
    ));

    let shutdown = CancellationToken::new();
    let listener = schedule.then(|| orchestrator.listen(shutdown.clone()));

    let loaded = registry.load(config.agents).await;
    info!(agents = loaded, state_dir = %paths.state_dir.display(), schedule, "daemon started");

    Ok(Daemon {
        paths,
        registry,
        preferences,
        orchestrator,
        reports,
        shutdown,
        listener,
        start_time: Instant::now(),
    })
}
