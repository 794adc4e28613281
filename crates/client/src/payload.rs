// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed payloads of the pushed messages.
//!
//! The client is loose about scalar types: ids arrive as `"01"` or `1`,
//! option values as strings, numbers or booleans. The deserializers here
//! accept either form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse a client timestamp; `<invalid>` and blanks are `None`.
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('<') {
        return None;
    }
    DateTime::parse_from_rfc3339(text).ok().map(|t| t.with_timezone(&Utc))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(de)?;
    Ok(match &value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_time<'de, D: Deserializer<'de>>(de: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<String>::deserialize(de)?;
    Ok(value.as_deref().and_then(parse_time))
}

fn lenient_map<'de, D: Deserializer<'de>>(de: D) -> Result<BTreeMap<String, String>, D::Error> {
    let map = Option::<BTreeMap<String, Value>>::deserialize(de)?.unwrap_or_default();
    Ok(map.into_iter().map(|(k, v)| (k, scalar_to_string(&v))).collect())
}

/// One `[section, [key, value], ...]` group of the `info` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InfoSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

/// Client and host description from the `info` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    pub sections: Vec<InfoSection>,
}

impl Info {
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v.as_str())
    }

    pub fn client_version(&self) -> Option<&str> {
        self.get("FAHClient", "Version")
    }
}

impl<'de> Deserialize<'de> for Info {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let groups = Vec::<Vec<Value>>::deserialize(de)?;
        let sections = groups
            .into_iter()
            .filter_map(|group| {
                let mut group = group.into_iter();
                let name = group.next().map(|v| scalar_to_string(&v))?;
                let entries = group
                    .filter_map(|pair| match pair {
                        Value::Array(kv) if kv.len() == 2 => {
                            Some((scalar_to_string(&kv[0]), scalar_to_string(&kv[1])))
                        }
                        _ => None,
                    })
                    .collect();
                Some(InfoSection { name, entries })
            })
            .collect();
        Ok(Info { sections })
    }
}

/// Client-wide options from `options -a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    #[serde(deserialize_with = "lenient_map")]
    pub values: BTreeMap<String, String>,
}

impl Options {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// One entry of `slot-info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    #[serde(deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_map")]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub idle: bool,
}

/// Payload of `slot-options`; identifies its slot by `machine-id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotOptions {
    #[serde(deserialize_with = "lenient_map")]
    pub values: BTreeMap<String, String>,
}

impl SlotOptions {
    pub fn machine_id(&self) -> Option<u32> {
        self.values.get("machine-id").and_then(|id| id.trim().parse().ok())
    }
}

/// Queue state of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitState {
    Running,
    Ready,
    Download,
    Send,
    Paused,
    #[default]
    #[serde(other)]
    Unknown,
}

fw_core::simple_display! {
    UnitState {
        Running => "RUNNING",
        Ready => "READY",
        Download => "DOWNLOAD",
        Send => "SEND",
        Paused => "PAUSED",
        Unknown => "UNKNOWN",
    }
}

/// One entry of `queue-info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    #[serde(deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(default)]
    pub state: UnitState,
    #[serde(default)]
    pub error: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub project: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub run: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub clone: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub gen: u32,
    #[serde(default)]
    pub core: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub slot: u32,
    #[serde(default, deserialize_with = "lenient_time")]
    pub assigned: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub timeout: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub totalframes: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub framesdone: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub attempts: u32,
    #[serde(default)]
    pub percentdone: String,
    #[serde(default)]
    pub ws: String,
    #[serde(default)]
    pub cs: String,
}

impl UnitInfo {
    pub fn project_info(&self) -> fw_core::ProjectInfo {
        fw_core::ProjectInfo::new(self.project, self.run, self.clone, self.gen)
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
