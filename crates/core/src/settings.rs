// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted configuration for one agent.

use crate::identity::{AgentId, AgentIdentity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default command server port of a v7 client.
pub const DEFAULT_PORT: u16 = 36330;

/// Which protocol implementation serves an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Fah,
    /// Any kind this build does not know; agent factories refuse it.
    #[serde(other)]
    Unknown,
}

crate::simple_display! {
    AgentKind {
        Fah => "fah",
        Unknown => "unknown",
    }
}

/// Errors from settings validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("agent name is empty")]
    EmptyName,
    #[error("agent name '{0}' contains invalid characters")]
    InvalidName(String),
    #[error("agent '{0}' has no host")]
    EmptyHost(String),
    #[error("agent '{0}' has an invalid port")]
    InvalidPort(String),
}

/// Settings for one configured agent.
///
/// Owned by the caller; the registry only wraps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub kind: AgentKind,
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<AgentId>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl AgentSettings {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind: AgentKind::Fah,
            name: name.into(),
            host: host.into(),
            port,
            password: None,
            disabled: false,
            unique_id: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_unique_id(mut self, id: impl Into<AgentId>) -> Self {
        self.unique_id = Some(id.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn identity(&self) -> AgentIdentity {
        AgentIdentity {
            name: self.name.clone(),
            host: self.host.clone(),
            port: self.port,
            unique_id: self.unique_id.clone(),
        }
    }

    /// Registry key for these settings.
    pub fn key(&self) -> String {
        self.identity().key()
    }

    /// Password when one is configured and non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Check name, host and port.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SettingsError::EmptyName);
        }
        if !name.chars().all(is_name_char) {
            return Err(SettingsError::InvalidName(self.name.clone()));
        }
        if self.host.trim().is_empty() {
            return Err(SettingsError::EmptyHost(self.name.clone()));
        }
        if self.port == 0 {
            return Err(SettingsError::InvalidPort(self.name.clone()));
        }
        Ok(())
    }
}

/// Names end up in report file names, so keep them to a conservative set.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '+' | '(' | ')' | '[' | ']' | '@')
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
