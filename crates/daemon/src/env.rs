// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: FW_STATE_DIR > XDG_STATE_HOME/foldwatch > ~/.local/state/foldwatch
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("FW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("foldwatch"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/foldwatch"))
}

/// Explicit config file path, if `FW_CONFIG` is set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("FW_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Log filter directive (`FW_LOG`, default `info`).
pub fn log_filter() -> String {
    std::env::var("FW_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}
