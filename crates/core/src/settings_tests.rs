// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn valid_settings_pass() {
    let settings = AgentSettings::new("rig-01 (gpu)", "192.168.1.4", DEFAULT_PORT);
    assert_eq!(settings.validate(), Ok(()));
}

#[yare::parameterized(
    empty_name   = { "",        "host", 36330, SettingsError::EmptyName },
    blank_name   = { "   ",     "host", 36330, SettingsError::EmptyName },
    bad_char     = { "rig/01",  "host", 36330, SettingsError::InvalidName("rig/01".into()) },
    empty_host   = { "rig",     "",     36330, SettingsError::EmptyHost("rig".into()) },
    zero_port    = { "rig",     "host", 0,     SettingsError::InvalidPort("rig".into()) },
)]
fn invalid_settings_are_rejected(name: &str, host: &str, port: u16, expected: SettingsError) {
    let settings = AgentSettings::new(name, host, port);
    assert_eq!(settings.validate(), Err(expected));
}

#[test]
fn empty_password_is_no_credential() {
    let settings = AgentSettings::new("rig", "host", 1).with_password("");
    assert_eq!(settings.credential(), None);
    let settings = settings.with_password("secret");
    assert_eq!(settings.credential(), Some("secret"));
}

#[test]
fn settings_deserialize_with_defaults() {
    let settings: AgentSettings =
        serde_json::from_str(r#"{"name":"rig","host":"10.0.0.5"}"#).unwrap();
    assert_eq!(settings.kind, AgentKind::Fah);
    assert_eq!(settings.port, DEFAULT_PORT);
    assert!(!settings.disabled);
    assert_eq!(settings.key(), "rig@10.0.0.5:36330");
}

#[test]
fn unknown_kind_deserializes_as_unknown() {
    let settings: AgentSettings =
        serde_json::from_str(r#"{"kind":"legacy","name":"rig","host":"h"}"#).unwrap();
    assert_eq!(settings.kind, AgentKind::Unknown);
    assert_eq!(settings.kind.to_string(), "unknown");
}

#[test]
fn identity_carries_unique_id() {
    let settings = AgentSettings::new("rig", "host", 1).with_unique_id("guid");
    assert_eq!(settings.identity().unique_id(), Some(&AgentId::new("guid")));
    assert_eq!(settings.key(), "guid");
}
