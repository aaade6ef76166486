//! Workspace metadata (the per-environment backend settings)
//!
//! The metadata document is a table keyed by workspace name:
//!
//! ```yaml
//! dev:
//!   account_id: "111111111111"
//!   account: development
//!   bucket_region: eu-west-2
//!   bucket: acme-tf-state-dev
//!   dynamodb: acme-tf-locks-dev
//! ```
//!
//! `region`/`bucket_region` and `lock_table`/`dynamodb` are accepted
//! interchangeably. A list of such tables is also accepted and merged.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tokio::fs;

use crate::error::{Error, Result};

/// Target environment of a run, fully validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub name: String,
    pub account_id: String,
    pub account: String,
    pub region: String,
    pub bucket: String,
    pub lock_table: String,
}

impl Workspace {
    /// `name|account_id|account` label shown in the workspace picker
    pub fn label(&self) -> String {
        format!("{}|{}|{}", self.name, self.account_id, self.account)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(u64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(text) => f.write_str(text),
            Scalar::Number(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawWorkspace {
    #[serde(default)]
    account_id: Option<Scalar>,
    #[serde(default)]
    account: Option<String>,
    #[serde(default, alias = "bucket_region")]
    region: Option<String>,
    #[serde(default)]
    bucket: Option<String>,
    #[serde(default, alias = "dynamodb")]
    lock_table: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvsDocument {
    Table(BTreeMap<String, RawWorkspace>),
    List(Vec<BTreeMap<String, RawWorkspace>>),
}

fn required(name: &str, field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!(
            "workspace '{name}' is missing required field '{field}'"
        ))),
    }
}

impl RawWorkspace {
    fn validate(self, name: &str) -> Result<Workspace> {
        Ok(Workspace {
            name: name.to_string(),
            account_id: self.account_id.map(|id| id.to_string()).unwrap_or_default(),
            account: self.account.unwrap_or_default(),
            region: required(name, "region", self.region)?,
            bucket: required(name, "bucket", self.bucket)?,
            lock_table: required(name, "lock_table", self.lock_table)?,
        })
    }
}

/// Metadata format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvsFormat {
    Yaml,
    Toml,
}

impl EnvsFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => EnvsFormat::Toml,
            _ => EnvsFormat::Yaml,
        }
    }
}

/// All workspaces of the repository, loaded and validated once.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceCatalog {
    workspaces: BTreeMap<String, Workspace>,
}

impl WorkspaceCatalog {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "workspace metadata file {} not found",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await?;
        Self::parse(&content, EnvsFormat::from_path(path)).map_err(|e| match e {
            Error::Config(message) => Error::Config(format!("{}: {}", path.display(), message)),
            other => other,
        })
    }

    pub fn parse(content: &str, format: EnvsFormat) -> Result<Self> {
        let document: EnvsDocument = match format {
            EnvsFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| Error::Config(format!("malformed workspace metadata: {e}")))?,
            EnvsFormat::Toml => toml::from_str(content)
                .map_err(|e| Error::Config(format!("malformed workspace metadata: {e}")))?,
        };

        let tables = match document {
            EnvsDocument::Table(table) => vec![table],
            EnvsDocument::List(tables) => tables,
        };

        let mut workspaces = BTreeMap::new();
        for table in tables {
            for (name, raw) in table {
                if workspaces.contains_key(&name) {
                    tracing::warn!(
                        "Workspace '{}' defined more than once, keeping the first",
                        name
                    );
                    continue;
                }
                let workspace = raw.validate(&name)?;
                workspaces.insert(name, workspace);
            }
        }

        tracing::debug!("Loaded {} workspace(s)", workspaces.len());
        Ok(Self { workspaces })
    }

    pub fn from_workspaces(workspaces: impl IntoIterator<Item = Workspace>) -> Self {
        Self {
            workspaces: workspaces
                .into_iter()
                .map(|workspace| (workspace.name.clone(), workspace))
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Workspace> {
        self.workspaces.get(name).cloned().ok_or_else(|| {
            Error::Config(format!(
                "workspace '{}' not found (known: {})",
                name,
                self.names().join(", ")
            ))
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.workspaces.keys().cloned().collect()
    }

    pub fn choices(&self) -> Vec<String> {
        self.workspaces.values().map(Workspace::label).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}
