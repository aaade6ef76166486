//! Filesystem preparation of a module directory before terraform runs

use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Remove the previous plan file and `.terraform` cache; either may be absent.
pub async fn reset_module(module_dir: &Path, plan_file: &str) -> io::Result<()> {
    if !module_dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("module directory {} does not exist", module_dir.display()),
        ));
    }

    let plan = module_dir.join(plan_file);
    if fs::symlink_metadata(&plan).await.is_ok() {
        fs::remove_file(&plan).await?;
    }

    let cache = module_dir.join(".terraform");
    if cache.is_dir() {
        fs::remove_dir_all(&cache).await?;
    } else if fs::symlink_metadata(&cache).await.is_ok() {
        fs::remove_file(&cache).await?;
    }
    Ok(())
}

/// Copy the shared override files into the module directory
pub async fn copy_overrides(
    override_dir: &Path,
    files: &[String],
    module_dir: &Path,
) -> io::Result<()> {
    for file in files {
        let source = override_dir.join(file);
        let target = module_dir.join(file);
        fs::copy(&source, &target).await.map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("copying {} failed: {}", source.display(), e),
            )
        })?;
    }
    Ok(())
}

/// Path of `variables_dir/<file>` as seen from a module directory, both given
/// relative to the repository root.
pub fn relative_link_target(module_rel: &Path, variables_rel: &Path, file: &str) -> PathBuf {
    let depth = module_rel
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count();

    let mut target = PathBuf::new();
    for _ in 0..depth {
        target.push("..");
    }
    for component in variables_rel.components() {
        if let Component::Normal(part) = component {
            target.push(part);
        }
    }
    target.push(file);
    target
}

#[cfg(unix)]
async fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(windows)]
async fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    fs::symlink_file(target, link).await
}

/// Link each shared file into the module directory, replacing stale links
pub async fn link_shared_files(
    root: &Path,
    module_rel: &Path,
    variables_rel: &Path,
    files: &[String],
) -> io::Result<()> {
    let module_dir = root.join(module_rel);

    for file in files {
        let link = module_dir.join(file);
        if let Ok(metadata) = fs::symlink_metadata(&link).await {
            if metadata.file_type().is_symlink() {
                debug!("Removing old link {}", link.display());
                fs::remove_file(&link).await?;
            }
        }

        let target = relative_link_target(module_rel, variables_rel, file);
        debug!("Linking {} -> {}", link.display(), target.display());
        symlink(&target, &link).await.map_err(|e| {
            io::Error::new(e.kind(), format!("linking {} failed: {}", link.display(), e))
        })?;
    }
    Ok(())
}
