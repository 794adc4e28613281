// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity.
//!
//! An agent is addressed by `name@host:port`, but when the agent has reported
//! a unique id (or one was configured) that id alone decides identity. This
//! keeps an agent stable across renames and host moves.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

crate::define_id! {
    /// Unique identifier of a remote agent.
    ///
    /// Opaque to foldwatch; usually the client's own GUID.
    pub struct AgentId;
}

/// Immutable identity of one remote agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<AgentId>,
}

impl AgentIdentity {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self { name: name.into(), host: host.into(), port, unique_id: None }
    }

    pub fn with_unique_id(mut self, id: impl Into<AgentId>) -> Self {
        self.unique_id = Some(id.into());
        self
    }

    /// The unique id when present and non-blank.
    pub fn unique_id(&self) -> Option<&AgentId> {
        self.unique_id.as_ref().filter(|id| !id.is_empty())
    }

    /// `host:port` for opening a connection.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Registry key: the unique id if present, otherwise `name@host:port`.
    pub fn key(&self) -> String {
        match self.unique_id() {
            Some(id) => id.to_string(),
            None => format!("{}@{}:{}", self.name, self.host, self.port),
        }
    }

    fn has_unique_id(&self, other: &Self) -> bool {
        self.unique_id().is_some() || other.unique_id().is_some()
    }

    fn unique_str(&self) -> &str {
        self.unique_id().map(AgentId::as_str).unwrap_or("")
    }
}

impl PartialEq for AgentIdentity {
    fn eq(&self, other: &Self) -> bool {
        if self.has_unique_id(other) {
            return self.unique_str() == other.unique_str();
        }
        self.name == other.name && self.host == other.host && self.port == other.port
    }
}

impl Eq for AgentIdentity {}

impl PartialOrd for AgentIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AgentIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.has_unique_id(other) {
            return self.unique_str().cmp(other.unique_str());
        }
        self.name
            .cmp(&other.name)
            .then_with(|| self.host.cmp(&other.host))
            .then_with(|| self.port.cmp(&other.port))
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.host, self.port)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
