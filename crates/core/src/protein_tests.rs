// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn protein(project: u32, credit: f64) -> Protein {
    Protein {
        project,
        work_unit_name: format!("p{project}"),
        core: "0xa8".to_string(),
        num_atoms: 0,
        frames: 100,
        credit,
        k_factor: 0.0,
        preferred_days: 1.0,
        maximum_days: 2.0,
    }
}

#[test]
fn lookup_by_project() {
    let table: ProteinTable = [protein(7610, 1200.0), protein(14200, 300.0)].into_iter().collect();

    assert_eq!(table.len(), 2);
    assert_eq!(table.get(7610).map(|p| p.credit), Some(1200.0));
    assert_eq!(table.get(1), None);
}

#[test]
fn insert_replaces_same_project() {
    let table = ProteinTable::new();
    assert!(table.is_empty());

    table.insert(protein(7610, 1200.0));
    table.insert(protein(7610, 900.0));

    assert_eq!(table.len(), 1);
    assert_eq!(table.get(7610).map(|p| p.credit), Some(900.0));
}

#[test]
fn descriptor_fields_default_when_absent() {
    let protein: Protein = serde_json::from_str(r#"{"project": 7610}"#).unwrap();
    assert_eq!(protein.project, 7610);
    assert!(protein.work_unit_name.is_empty());
    assert_eq!(protein.frames, 0);
}
