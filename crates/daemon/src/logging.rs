// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleError;

/// Log to a daily file under `log_dir` and to stderr, filtered by `FW_LOG`.
///
/// The returned guard flushes the file writer on drop; hold it for the
/// lifetime of the process.
pub fn init(log_dir: &Path) -> Result<WorkerGuard, LifecycleError> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "fwd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(crate::env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false).compact();
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).compact();

    tracing_subscriber::registry().with(filter).with(file_layer).with(stderr_layer).init();
    Ok(guard)
}
