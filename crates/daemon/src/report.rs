// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report output.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fw_client::Resources;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Consumer of published agent resources.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, resources: &[Arc<Resources>]) -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct Document<'a> {
    generated: DateTime<Utc>,
    agents: Vec<&'a Resources>,
}

/// Writes every agent's resources as one JSON document.
pub struct JsonReport {
    path: PathBuf,
}

impl JsonReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportGenerator for JsonReport {
    async fn generate(&self, resources: &[Arc<Resources>]) -> anyhow::Result<()> {
        let document = Document { generated: Utc::now(), agents: resources.iter().map(Arc::as_ref).collect() };
        let bytes = serde_json::to_vec_pretty(&document)?;

        // Write then rename so readers never see a partial report
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::info!(path = %self.path.display(), agents = resources.len(), "report written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
