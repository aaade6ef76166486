//! Module selection
//!
//! Each run picks its module list from exactly one source (interactive pick,
//! deploy/gitops manifest, merge-request diff, explicit list or the
//! prerequisite set) and then passes it through the [`RestrictionPolicy`].

pub mod diff;
pub mod discovery;
pub mod interactive;
pub mod manifest;

pub use diff::{change_set, module_dir_for_path, ChangeSet, IGNORED_SUBPATHS};
pub use discovery::discover_modules;
pub use interactive::InteractiveSelector;
pub use manifest::{DeployManifest, GitopsManifest};

use std::path::Path;
use tracing::info;

use crate::build::ModuleRef;
use crate::error::{Error, Result};

/// Modules that may only be built in one designated workspace.
#[derive(Debug, Clone)]
pub struct RestrictionPolicy {
    designated_workspace: String,
    restricted: Vec<ModuleRef>,
}

/// Result of applying the [`RestrictionPolicy`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    pub kept: Vec<ModuleRef>,
    pub removed: Vec<ModuleRef>,
}

impl RestrictionPolicy {
    pub fn new(designated_workspace: impl Into<String>, restricted: Vec<ModuleRef>) -> Self {
        Self {
            designated_workspace: designated_workspace.into(),
            restricted,
        }
    }

    pub fn designated_workspace(&self) -> &str {
        &self.designated_workspace
    }

    /// Drop restricted modules unless `workspace` is the designated one.
    /// Never fails; every removal is logged and reported in [`Filtered::removed`].
    pub fn apply(&self, modules: Vec<ModuleRef>, workspace: &str) -> Filtered {
        if workspace == self.designated_workspace {
            return Filtered {
                kept: modules,
                removed: Vec::new(),
            };
        }

        let (removed, kept): (Vec<_>, Vec<_>) = modules
            .into_iter()
            .partition(|module| self.restricted.contains(module));

        for module in &removed {
            info!(
                "Module {} is built in the {} workspace only, skipping it for {}",
                module, self.designated_workspace, workspace
            );
        }

        Filtered { kept, removed }
    }
}

/// Reject modules whose directory does not exist under `root`
pub fn ensure_modules_exist(root: &Path, modules: &[ModuleRef]) -> Result<()> {
    let missing: Vec<String> = modules
        .iter()
        .filter(|module| !module.resolve(root).is_dir())
        .map(ModuleRef::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "module directories not found: {}",
            missing.join(", ")
        )))
    }
}

/// Parse a comma or whitespace separated `--modules` value
pub fn parse_module_list(value: &str) -> Vec<ModuleRef> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(ModuleRef::new)
        .collect()
}
