// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fwd: foldwatch monitoring daemon

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fw_daemon::{logging, startup, Config, Paths};
use tracing::info;

#[derive(Parser)]
#[command(name = "fwd", version, about = "Monitor Folding@home v7 clients")]
struct Cli {
    /// Config file (defaults to $FW_CONFIG, then config.toml in the state directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refresh every agent once, write the report and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Paths::load(cli.config).context("resolving daemon paths")?;
    let _log_guard = logging::init(&paths.log_dir).context("initializing logging")?;
    let config = Config::load(&paths.config_path)?;

    let daemon = startup(config, paths, !cli.once).await.context("starting daemon")?;

    if cli.once {
        let result = daemon.run_once().await;
        daemon.shutdown().await;
        return result.context("one-shot refresh");
    }

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("interrupt received");
    daemon.shutdown().await;
    Ok(())
}
