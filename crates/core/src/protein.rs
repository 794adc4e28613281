// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project descriptors from the production-rate service.
//!
//! Only the lookup boundary lives here; credit and ETA arithmetic belongs to
//! whoever renders reports.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptive and credit metadata for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protein {
    pub project: u32,
    #[serde(default)]
    pub work_unit_name: String,
    #[serde(default)]
    pub core: String,
    #[serde(default)]
    pub num_atoms: u32,
    #[serde(default)]
    pub frames: u32,
    #[serde(default)]
    pub credit: f64,
    #[serde(default)]
    pub k_factor: f64,
    #[serde(default)]
    pub preferred_days: f64,
    #[serde(default)]
    pub maximum_days: f64,
}

/// Lookup of project descriptors.
pub trait ProteinService: Send + Sync {
    fn get(&self, project: u32) -> Option<Protein>;
}

/// In-memory descriptor table.
#[derive(Debug, Default)]
pub struct ProteinTable {
    proteins: RwLock<HashMap<u32, Protein>>,
}

impl ProteinTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, protein: Protein) {
        self.proteins.write().insert(protein.project, protein);
    }

    pub fn len(&self) -> usize {
        self.proteins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.read().is_empty()
    }
}

impl FromIterator<Protein> for ProteinTable {
    fn from_iter<I: IntoIterator<Item = Protein>>(iter: I) -> Self {
        let table = Self::new();
        for protein in iter {
            table.insert(protein);
        }
        table
    }
}

impl ProteinService for ProteinTable {
    fn get(&self, project: u32) -> Option<Protein> {
        self.proteins.read().get(&project).cloned()
    }
}

#[cfg(test)]
#[path = "protein_tests.rs"]
mod tests;
