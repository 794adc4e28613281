// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::arb_identity;
use proptest::prelude::*;

#[test]
fn identities_without_unique_id_compare_by_address() {
    let a = AgentIdentity::new("rig", "10.0.0.2", 36330);
    let b = AgentIdentity::new("rig", "10.0.0.2", 36330);
    let c = AgentIdentity::new("rig", "10.0.0.2", 36331);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a < c);
}

#[test]
fn ordering_without_unique_id_is_name_then_host_then_port() {
    let mut ids = vec![
        AgentIdentity::new("b", "host", 1),
        AgentIdentity::new("a", "zeta", 1),
        AgentIdentity::new("a", "alpha", 2),
        AgentIdentity::new("a", "alpha", 1),
    ];
    ids.sort();
    let order: Vec<_> = ids.iter().map(|i| (i.name.as_str(), i.host.as_str(), i.port)).collect();
    assert_eq!(order, vec![("a", "alpha", 1), ("a", "alpha", 2), ("a", "zeta", 1), ("b", "host", 1)]);
}

#[test]
fn unique_id_on_one_side_only_is_not_equal() {
    let a = AgentIdentity::new("rig", "host", 36330).with_unique_id("abc");
    let b = AgentIdentity::new("rig", "host", 36330);
    assert_ne!(a, b);
    assert_ne!(b, a);
}

#[test]
fn blank_unique_id_is_treated_as_missing() {
    let a = AgentIdentity::new("rig", "host", 36330).with_unique_id("  ");
    let b = AgentIdentity::new("rig", "host", 36330);
    assert_eq!(a, b);
    assert_eq!(a.key(), "rig@host:36330");
}

#[test]
fn key_prefers_unique_id() {
    let a = AgentIdentity::new("rig", "host", 36330).with_unique_id("guid-1");
    assert_eq!(a.key(), "guid-1");
    assert_eq!(a.address(), "host:36330");
}

#[test]
fn agent_id_serde() {
    let id = AgentId::new("my-agent");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"my-agent\"");

    let parsed: AgentId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

proptest! {
    #[test]
    fn unique_id_alone_governs_equality_and_ordering(
        a in arb_identity(),
        b in arb_identity(),
        id_a in "[a-f0-9]{4,8}",
        id_b in "[a-f0-9]{4,8}",
    ) {
        let a = a.with_unique_id(id_a.as_str());
        let b = b.with_unique_id(id_b.as_str());
        prop_assert_eq!(a == b, id_a == id_b);
        prop_assert_eq!(a.cmp(&b), id_a.cmp(&id_b));
    }

    #[test]
    fn shared_unique_id_ignores_address(a in arb_identity(), b in arb_identity(), id in "[a-f0-9]{8}") {
        let a = a.with_unique_id(id.as_str());
        let b = b.with_unique_id(id.as_str());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.cmp(&b), Ordering::Equal);
    }
}
