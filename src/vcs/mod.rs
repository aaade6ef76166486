//! Version-control hosting seam used by diff-driven selection

pub mod gitlab;

pub use gitlab::GitLabClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// One changed file between two refs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiffEntry {
    pub old_path: String,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
}

/// Source of the files changed between two refs
#[async_trait]
pub trait DiffSource: Send + Sync {
    async fn compare(&self, base: &str, head: &str) -> Result<Vec<DiffEntry>>;
}

/// Fixed list of changes, for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct StaticDiff {
    entries: Vec<DiffEntry>,
}

impl StaticDiff {
    pub fn new(entries: Vec<DiffEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl DiffSource for StaticDiff {
    async fn compare(&self, _base: &str, _head: &str) -> Result<Vec<DiffEntry>> {
        Ok(self.entries.clone())
    }
}
