//! Run configuration
//!
//! [`Settings`] carries every path and constant the orchestrator needs. The
//! defaults describe the conventional infrastructure repository layout; an
//! optional `tfrun.toml` at the repository root overrides any of them and the
//! CLI applies its flags last.

pub mod workspace;

pub use workspace::{Workspace, WorkspaceCatalog};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::build::ModuleRef;
use crate::error::{Error, Result};
use crate::selector::RestrictionPolicy;

pub const SETTINGS_FILE: &str = "tfrun.toml";
pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_MAX_WORKERS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Repository root every relative path below is resolved against
    #[serde(skip)]
    pub root: PathBuf,
    pub envs_file: PathBuf,
    pub deploy_manifest: PathBuf,
    pub gitops_manifest: PathBuf,
    pub module_dirs: Vec<PathBuf>,
    pub variables_dir: PathBuf,
    pub override_dir: PathBuf,
    pub override_files: Vec<String>,
    pub linked_files: Vec<String>,
    pub plan_file: String,
    pub terraform_bin: String,
    pub designated_workspace: String,
    pub restricted_modules: Vec<ModuleRef>,
    pub prerequisite_modules: Vec<ModuleRef>,
    pub default_workspace: String,
    pub gitlab_url: String,
    pub project_id: u64,
    pub base_ref: String,
    pub max_workers: usize,
    pub region: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            envs_file: PathBuf::from("variables/envs.yaml"),
            deploy_manifest: PathBuf::from("deploy.yaml"),
            gitops_manifest: PathBuf::from("gitops.yaml"),
            module_dirs: vec![PathBuf::from("main")],
            variables_dir: PathBuf::from("variables"),
            override_dir: PathBuf::from("variables/config"),
            override_files: vec![
                "backend_override.tf".to_string(),
                "providers_override.tf".to_string(),
            ],
            linked_files: vec![
                "_accounts.tf".to_string(),
                "_backend.tf".to_string(),
                "_envs.tf".to_string(),
                "_providers.tf".to_string(),
            ],
            plan_file: "plan.out".to_string(),
            terraform_bin: "terraform".to_string(),
            designated_workspace: "sre".to_string(),
            restricted_modules: vec![
                ModuleRef::new("./main/containers/ecr-repositories"),
                ModuleRef::new("./main/management/email-setup"),
            ],
            prerequisite_modules: vec![ModuleRef::new("./main/networkings/security-groups")],
            default_workspace: "dev".to_string(),
            gitlab_url: "https://gitlab.com".to_string(),
            project_id: 39439064,
            base_ref: "main".to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl Settings {
    /// Load settings for the repository at `root`.
    ///
    /// `config` names an explicit settings file, which must exist. Without it
    /// `<root>/tfrun.toml` is used when present, otherwise the defaults.
    pub async fn load(root: &Path, config: Option<&Path>) -> Result<Self> {
        let (path, required) = match config {
            Some(path) => (path.to_path_buf(), true),
            None => (root.join(SETTINGS_FILE), false),
        };

        let mut settings = if path.exists() {
            tracing::debug!("Loading settings from {}", path.display());
            let content = fs::read_to_string(&path).await?;
            toml::from_str::<Settings>(&content).map_err(|e| {
                Error::Config(format!("invalid settings file {}: {}", path.display(), e))
            })?
        } else if required {
            return Err(Error::Config(format!(
                "settings file {} not found",
                path.display()
            )));
        } else {
            Settings::default()
        };

        settings.root = root.to_path_buf();
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be at least 1".to_string()));
        }
        if self.module_dirs.is_empty() {
            return Err(Error::Config("module_dirs must not be empty".to_string()));
        }
        if self.plan_file.trim().is_empty() {
            return Err(Error::Config("plan_file must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve a configured path against the repository root
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn restriction_policy(&self) -> RestrictionPolicy {
        RestrictionPolicy::new(
            self.designated_workspace.clone(),
            self.restricted_modules.clone(),
        )
    }
}
