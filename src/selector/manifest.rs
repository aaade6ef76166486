//! Declarative module lists for non-interactive runs
//!
//! `deploy.yaml` lists modules per workspace:
//!
//! ```yaml
//! workspace:
//!   - dev:
//!       modules:
//!         - ./main/networking/security-groups
//!         - ./main/storage/s3
//! ```
//!
//! `gitops.yaml` names one workspace, its modules and the action:
//!
//! ```yaml
//! workspace: dev
//! tf_action: plan
//! modules:
//!   - ./main/storage/s3
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

use crate::build::{Action, ModuleRef};
use crate::error::{Error, Result};

async fn read_manifest(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::Manifest(format!(
            "manifest {} not found",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path).await?)
}

#[derive(Debug, Clone, Deserialize)]
struct WorkspaceModules {
    #[serde(default)]
    modules: Vec<ModuleRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WorkspaceTable {
    Table(BTreeMap<String, WorkspaceModules>),
    List(Vec<BTreeMap<String, WorkspaceModules>>),
}

#[derive(Debug, Clone, Deserialize)]
struct RawDeployManifest {
    workspace: WorkspaceTable,
}

/// Module lists keyed by workspace name
#[derive(Debug, Clone, Default)]
pub struct DeployManifest {
    workspaces: BTreeMap<String, Vec<ModuleRef>>,
}

impl DeployManifest {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = read_manifest(path).await?;
        Self::parse(&content)
            .map_err(|e| Error::Manifest(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawDeployManifest = serde_yaml::from_str(content)
            .map_err(|e| Error::Manifest(format!("malformed deploy manifest: {e}")))?;

        let tables = match raw.workspace {
            WorkspaceTable::Table(table) => vec![table],
            WorkspaceTable::List(tables) => tables,
        };

        let mut workspaces = BTreeMap::new();
        for table in tables {
            for (name, entry) in table {
                workspaces.entry(name).or_insert(entry.modules);
            }
        }

        Ok(Self { workspaces })
    }

    /// Declared modules for `workspace`
    pub fn modules_for(&self, workspace: &str) -> Result<Vec<ModuleRef>> {
        self.workspaces.get(workspace).cloned().ok_or_else(|| {
            Error::Manifest(format!(
                "workspace '{workspace}' is not declared in the deploy manifest"
            ))
        })
    }
}

/// Ad-hoc gitops run: one workspace, its modules and the action to take
#[derive(Debug, Clone, Deserialize)]
pub struct GitopsManifest {
    pub workspace: String,
    #[serde(default)]
    pub modules: Vec<ModuleRef>,
    #[serde(alias = "action")]
    pub tf_action: String,
}

impl GitopsManifest {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = read_manifest(path).await?;
        Self::parse(&content)
            .map_err(|e| Error::Manifest(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let manifest: GitopsManifest = serde_yaml::from_str(content)
            .map_err(|e| Error::Manifest(format!("malformed gitops manifest: {e}")))?;

        if manifest.workspace.trim().is_empty() {
            return Err(Error::Manifest("gitops manifest has no workspace".to_string()));
        }
        if manifest.modules.is_empty() {
            return Err(Error::Manifest("gitops manifest lists no modules".to_string()));
        }
        Ok(manifest)
    }

    pub fn action(&self) -> Result<Action> {
        self.tf_action.parse()
    }
}
