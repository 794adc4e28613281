// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration file.
//!
//! ```toml
//! [preferences]
//! refresh_interval_minutes = 5
//! report_enabled = true
//!
//! [[agents]]
//! name = "rig"
//! host = "192.168.1.20"
//! password = "secret"
//!
//! [[proteins]]
//! project = 7610
//! credit = 1200.0
//! ```

use crate::preferences::TaskPreferences;
use fw_core::{AgentSettings, Protein};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub preferences: TaskPreferences,
    #[serde(default)]
    pub agents: Vec<AgentSettings>,
    /// Project descriptors attached to matching work items.
    #[serde(default)]
    pub proteins: Vec<Protein>,
}

impl Config {
    /// Read `path`. A missing file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
