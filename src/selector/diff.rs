//! Merge-request diff to module set
//!
//! The mapping from a changed file to a module directory is purely textual and
//! must stay exactly as implemented in [`module_dir_for_path`]; any drift
//! silently changes what a merge request builds.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::build::ModuleRef;
use crate::vcs::DiffEntry;

/// Changed paths containing any of these are never built from a diff
pub const IGNORED_SUBPATHS: [&str; 10] = [
    "/lambda_artefacts/",
    "/serverless/",
    "/databases/",
    "/eks/",
    "/iam/",
    "/variables/config/",
    "/ecr-repositories/",
    "/tools/",
    "/email-setup/",
    "/vpc-endpoint-service/",
];

/// Why a diff entry did not contribute a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Renamed,
    Deleted,
    IgnoredSubpath(&'static str),
    NoExtension,
    OutsideModuleTree,
}

/// Map a changed file path to the module directory it belongs to.
///
/// Only paths under `terraform/` with more than three `/` qualify. Every
/// `terraform/` becomes `./`, every `/templates` and `/user_data` is removed,
/// every `/modules/` becomes `/main/` and the file name is dropped:
/// `terraform/modules/networking/sg/main.tf` maps to `./main/networking/sg`.
pub fn module_dir_for_path(path: &str) -> Option<ModuleRef> {
    if !path.starts_with("terraform/") || path.matches('/').count() <= 3 {
        return None;
    }

    let rewritten = path
        .replace("terraform/", "./")
        .replace("/templates", "")
        .replace("/user_data", "")
        .replace("/modules/", "/main/");

    let (dir, _file) = rewritten.rsplit_once('/')?;
    Some(ModuleRef::new(dir))
}

fn has_extension(path: &str) -> bool {
    Path::new(path).extension().is_some()
}

/// Decide whether a diff entry is considered at all
pub fn skip_reason(entry: &DiffEntry) -> Option<SkipReason> {
    if entry.renamed_file {
        return Some(SkipReason::Renamed);
    }
    if entry.deleted_file {
        return Some(SkipReason::Deleted);
    }
    if let Some(ignored) = IGNORED_SUBPATHS
        .iter()
        .find(|ignored| entry.old_path.contains(*ignored))
    {
        return Some(SkipReason::IgnoredSubpath(*ignored));
    }
    if !has_extension(&entry.old_path) {
        // Directory-only entries carry no extension
        return Some(SkipReason::NoExtension);
    }
    None
}

/// Set of module directories touched by a diff. Never mutated in place;
/// filtering returns a new set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    modules: BTreeSet<ModuleRef>,
}

impl ChangeSet {
    pub fn from_entries(entries: &[DiffEntry]) -> Self {
        let mut modules = BTreeSet::new();

        for entry in entries {
            if let Some(reason) = skip_reason(entry) {
                debug!("Ignoring changed path {} ({:?})", entry.old_path, reason);
                continue;
            }

            match module_dir_for_path(&entry.old_path) {
                Some(module) => {
                    modules.insert(module);
                }
                None => debug!(
                    "Ignoring changed path {} ({:?})",
                    entry.old_path,
                    SkipReason::OutsideModuleTree
                ),
            }
        }

        Self { modules }
    }

    /// Keep only modules whose directory exists under `root`
    pub fn existing_under(&self, root: &Path) -> Self {
        let modules = self
            .modules
            .iter()
            .filter(|module| {
                let exists = module.resolve(root).is_dir();
                if !exists {
                    info!("Changed module {} has no directory, skipping", module);
                }
                exists
            })
            .cloned()
            .collect();
        Self { modules }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleRef> {
        self.modules.iter()
    }

    pub fn into_modules(self) -> Vec<ModuleRef> {
        self.modules.into_iter().collect()
    }
}

/// Modules touched by `entries` that exist under `root`, in sorted order
pub fn change_set(entries: &[DiffEntry], root: &Path) -> ChangeSet {
    ChangeSet::from_entries(entries).existing_under(root)
}
