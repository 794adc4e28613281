// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::connector::DuplexConnector;
use fw_core::test_support::local_settings;
use fw_core::{FakeClock, ProteinTable};

fn factory(connector: &DuplexConnector) -> DefaultAgentFactory {
    DefaultAgentFactory::new(
        Arc::new(connector.clone()),
        Arc::new(ProteinTable::new()),
        Arc::new(FakeClock::new()),
        FahAgentOptions::default(),
    )
}

#[test]
fn creates_agent_for_valid_settings() {
    let connector = DuplexConnector::new();
    let agent = factory(&connector).create(&local_settings("alpha")).unwrap();
    assert_eq!(agent.identity().name, "alpha");
    assert_eq!(agent.resources().status, AgentStatus::Disconnected);
    assert!(!agent.is_connected());
}

#[test]
fn disabled_settings_get_null_agent() {
    let connector = DuplexConnector::new();
    let agent = factory(&connector).create(&local_settings("alpha").disabled(true)).unwrap();
    assert_eq!(agent.resources().status, AgentStatus::Disabled);
}

#[yare::parameterized(
    empty_name = { AgentSettings::new("", "127.0.0.1", 36330) },
    no_host    = { AgentSettings::new("alpha", "", 36330) },
    port_zero  = { AgentSettings::new("alpha", "127.0.0.1", 0) },
)]
fn invalid_settings_are_rejected(settings: AgentSettings) {
    let connector = DuplexConnector::new();
    assert!(factory(&connector).create(&settings).is_none());
}

#[test]
fn unknown_kind_is_rejected() {
    let connector = DuplexConnector::new();
    let mut settings = local_settings("alpha");
    settings.kind = AgentKind::Unknown;
    assert!(factory(&connector).create(&settings).is_none());
}

#[tokio::test]
async fn null_agent_is_inert() {
    let agent = NullAgent::new(local_settings("alpha"));
    agent.refresh().await;
    agent.close().await;
    assert!(matches!(agent.connect().await, Err(AgentError::Disabled(_))));
    assert!(agent.resources().refreshed.is_none());
    assert!(!agent.is_connected());
}

#[tokio::test]
async fn fake_factory_records_agents() {
    let factory = FakeAgentFactory::new();
    factory.reject("bad");
    assert!(factory.create(&local_settings("bad")).is_none());

    let settings = local_settings("alpha");
    let agent = factory.create(&settings).unwrap();
    agent.refresh().await;
    let fake = factory.agent(&settings.key()).unwrap();
    assert_eq!(fake.refreshes(), 1);
    assert_eq!(factory.created(), 1);
}
