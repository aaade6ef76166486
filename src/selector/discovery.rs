use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::build::ModuleRef;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn is_terraform_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() && entry.path().extension().and_then(|e| e.to_str()) == Some("tf")
}

/// Every directory under `module_dirs` that directly contains a `.tf` file,
/// as sorted module references relative to `root`.
///
/// Hidden directories (`.terraform` caches included) are not descended into.
pub fn discover_modules(root: &Path, module_dirs: &[PathBuf]) -> Vec<ModuleRef> {
    let mut modules = BTreeSet::new();

    for module_dir in module_dirs {
        let base = root.join(module_dir);
        if !base.is_dir() {
            warn!("Module directory {} does not exist", base.display());
            continue;
        }

        let walker = WalkDir::new(&base)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));

        for entry in walker.filter_map(|entry| entry.ok()) {
            if !is_terraform_file(&entry) {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let Ok(relative) = dir.strip_prefix(root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            modules.insert(ModuleRef::new(relative));
        }
    }

    debug!("Discovered {} module(s)", modules.len());
    modules.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_modules_with_tf_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for module in ["main/networking/sg", "main/storage/s3", "main/storage/logs"] {
            fs::create_dir_all(root.join(module)).unwrap();
            fs::write(root.join(module).join("main.tf"), "").unwrap();
        }
        // No .tf file: not a module
        fs::create_dir_all(root.join("main/docs")).unwrap();
        fs::write(root.join("main/docs/README.md"), "").unwrap();
        // Provider cache must be ignored
        fs::create_dir_all(root.join("main/storage/s3/.terraform/modules/x")).unwrap();
        fs::write(root.join("main/storage/s3/.terraform/modules/x/main.tf"), "").unwrap();

        let modules = discover_modules(root, &[PathBuf::from("main")]);
        assert_eq!(
            modules,
            vec![
                ModuleRef::new("./main/networking/sg"),
                ModuleRef::new("./main/storage/logs"),
                ModuleRef::new("./main/storage/s3"),
            ]
        );
    }

    #[test]
    fn test_discover_modules_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_modules(dir.path(), &[PathBuf::from("main")]).is_empty());
    }

    #[test]
    fn test_discover_modules_multiple_roots_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("main/a")).unwrap();
        fs::write(root.join("main/a/main.tf"), "").unwrap();
        fs::write(root.join("main/a/outputs.tf"), "").unwrap();
        fs::create_dir_all(root.join("shared/b")).unwrap();
        fs::write(root.join("shared/b/main.tf"), "").unwrap();

        let modules = discover_modules(root, &[PathBuf::from("main"), PathBuf::from("shared")]);
        assert_eq!(
            modules,
            vec![ModuleRef::new("./main/a"), ModuleRef::new("./shared/b")]
        );
    }
}
