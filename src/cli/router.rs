//! Mode routing
//!
//! Turns parsed arguments into one [`BuildRequest`] and hands it to the
//! [`Orchestrator`]. Every configuration, manifest and validation problem
//! surfaces here, before any module runs.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::build::{Action, ApprovalMode, BuildRequest, ModuleRef};
use crate::cli::args::{Cli, SelectionMode};
use crate::config::{Settings, WorkspaceCatalog};
use crate::error::{Error, Result};
use crate::interaction::{UserPrompter, UserPrompterImpl};
use crate::orchestrator::{Orchestrator, RunReport};
use crate::runner::ModuleRunner;
use crate::selector::{
    change_set, discover_modules, ensure_modules_exist, DeployManifest, GitopsManifest,
    InteractiveSelector,
};
use crate::subprocess::{ProcessRunner, TokioProcessRunner};
use crate::vcs::{DiffSource, GitLabClient};

/// External systems a run talks to
pub struct Collaborators {
    pub process: Arc<dyn ProcessRunner>,
    pub prompter: Arc<dyn UserPrompter>,
    /// Used instead of the GitLab API in diff mode when set
    pub diff_source: Option<Arc<dyn DiffSource>>,
}

impl Collaborators {
    pub fn production() -> Self {
        Self {
            process: Arc::new(TokioProcessRunner),
            prompter: Arc::new(UserPrompterImpl::new()),
            diff_source: None,
        }
    }
}

/// Workspace, modules and action picked by one selection mode
#[derive(Debug, Clone)]
struct Selection {
    workspace: String,
    modules: Vec<ModuleRef>,
    action: Action,
    approval: ApprovalMode,
}

fn aborted() -> Error {
    Error::Aborted("User abort exiting...".to_string())
}

fn parse_action(value: Option<&str>) -> Result<Action> {
    value.unwrap_or("plan").parse()
}

/// Resolve the repository root and load settings, applying CLI overrides last
pub async fn load_settings(cli: &Cli) -> Result<Settings> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "repository root {} is not a directory",
            root.display()
        )));
    }

    let mut settings = Settings::load(&root, cli.config.as_deref()).await?;
    if let Some(region) = &cli.region {
        settings.region = region.clone();
    }
    if let Some(max_workers) = cli.max_workers {
        settings.max_workers = max_workers;
    }
    settings.validate()?;
    Ok(settings)
}

/// Run the whole invocation described by `cli`
pub async fn execute(cli: &Cli, collaborators: Collaborators) -> Result<RunReport> {
    let settings = load_settings(cli).await?;
    let catalog = WorkspaceCatalog::load(&settings.path(&settings.envs_file)).await?;

    let mode = cli.selection_mode();
    debug!("Selection mode: {:?}", mode);
    println!(
        "Parameters passed to orchestrator: tfaction: {}, workspace: {}, mode: {:?}, concurrent: {}",
        cli.tfaction.as_deref().unwrap_or("-"),
        cli.workspace.as_deref().unwrap_or("-"),
        mode,
        cli.concurrent
    );

    let Some(selection) = select(&mode, cli, &settings, &catalog, &collaborators).await? else {
        println!("No terraform modules changed, nothing to build");
        return Ok(RunReport::default());
    };

    let workspace = catalog.resolve(&selection.workspace)?;
    let policy = settings.restriction_policy();
    let filtered = policy.apply(selection.modules, &workspace.name);
    for module in &filtered.removed {
        println!(
            "This module is built in the {} workspace only: {}",
            policy.designated_workspace(),
            module
        );
    }

    let request = BuildRequest::assemble(
        workspace,
        filtered.kept,
        selection.action,
        selection.approval,
        cli.concurrent,
    )?;

    println!("\n******* Modules to run:  *********");
    for module in request.modules() {
        println!("{module}");
    }
    println!("**********************************");

    let runner = ModuleRunner::new(
        settings.clone(),
        Arc::clone(&collaborators.process),
        Arc::clone(&collaborators.prompter),
    );
    let report = Orchestrator::new(runner).run(&request).await;
    info!(
        "Run finished: {} succeeded, {} failed",
        report.succeeded().len(),
        report.failures().len()
    );
    Ok(report)
}

/// `Ok(None)` only when a diff touched no module
async fn select(
    mode: &SelectionMode,
    cli: &Cli,
    settings: &Settings,
    catalog: &WorkspaceCatalog,
    collaborators: &Collaborators,
) -> Result<Option<Selection>> {
    let default_workspace = || {
        cli.workspace
            .clone()
            .unwrap_or_else(|| settings.default_workspace.clone())
    };

    let selection = match mode {
        SelectionMode::Interactive => {
            println!("running in interactive mode");
            select_interactive(cli, settings, catalog, Arc::clone(&collaborators.prompter)).await?
        }
        SelectionMode::Deploy => {
            let workspace = cli.workspace.clone().ok_or_else(|| {
                Error::Validation("deploy mode requires --workspace".to_string())
            })?;
            let action = match &cli.tfaction {
                Some(action) => action.parse()?,
                None => {
                    return Err(Error::Validation(
                        "deploy mode requires --tfaction".to_string(),
                    ))
                }
            };
            catalog.resolve(&workspace)?;

            let manifest = DeployManifest::load(&settings.path(&settings.deploy_manifest)).await?;
            let modules = manifest.modules_for(&workspace)?;
            ensure_modules_exist(&settings.root, &modules)?;
            non_interactive(workspace, modules, action)
        }
        SelectionMode::Gitops(file) => {
            println!("Running in gitops mode...");
            let path: PathBuf = file.clone().unwrap_or_else(|| settings.gitops_manifest.clone());
            let manifest = GitopsManifest::load(&settings.path(&path)).await?;
            let action = manifest.action()?;
            catalog.resolve(&manifest.workspace)?;
            println!("modules to run in gitops mode... {:?}", manifest.modules);
            ensure_modules_exist(&settings.root, &manifest.modules)?;
            non_interactive(manifest.workspace, manifest.modules, action)
        }
        SelectionMode::Diff { branch } => {
            let workspace = default_workspace();
            catalog.resolve(&workspace)?;
            let action = parse_action(cli.tfaction.as_deref())?;

            let source: Arc<dyn DiffSource> = match &collaborators.diff_source {
                Some(source) => Arc::clone(source),
                None => {
                    let token = cli
                        .key
                        .clone()
                        .filter(|key| !key.trim().is_empty())
                        .ok_or_else(|| {
                            Error::Validation(
                                "diff mode requires an access token (--key or GITLAB_TOKEN)"
                                    .to_string(),
                            )
                        })?;
                    Arc::new(GitLabClient::new(
                        settings.gitlab_url.clone(),
                        settings.project_id,
                        token,
                    )?)
                }
            };

            println!(
                "********** Comparing file changes on merge request branch [{}] with {} **********",
                branch, settings.base_ref
            );
            let entries = source.compare(&settings.base_ref, branch).await?;
            println!("List of files changed in this merge request:");
            for entry in &entries {
                println!("  {}", entry.old_path);
            }

            let changed = change_set(&entries, &settings.root);
            if changed.is_empty() {
                return Ok(None);
            }
            non_interactive(workspace, changed.into_modules(), action)
        }
        SelectionMode::Explicit(modules) => {
            let action = parse_action(cli.tfaction.as_deref())?;
            ensure_modules_exist(&settings.root, modules)?;
            non_interactive(default_workspace(), modules.clone(), action)
        }
        SelectionMode::Prerequisites => {
            println!("Running prerequisite modules...");
            let action = parse_action(cli.tfaction.as_deref())?;
            let modules = settings.prerequisite_modules.clone();
            ensure_modules_exist(&settings.root, &modules)?;
            non_interactive(default_workspace(), modules, action)
        }
    };

    Ok(Some(selection))
}

fn non_interactive(workspace: String, modules: Vec<ModuleRef>, action: Action) -> Selection {
    Selection {
        workspace,
        modules,
        action,
        approval: ApprovalMode::NonInteractive,
    }
}

async fn select_interactive(
    cli: &Cli,
    settings: &Settings,
    catalog: &WorkspaceCatalog,
    prompter: Arc<dyn UserPrompter>,
) -> Result<Selection> {
    let selector = InteractiveSelector::new(prompter);

    let workspace = match &cli.workspace {
        Some(workspace) => workspace.clone(),
        None => selector
            .select_workspace(catalog)
            .await?
            .ok_or_else(aborted)?,
    };

    let candidates = discover_modules(&settings.root, &settings.module_dirs);
    let modules = selector
        .select_modules(&candidates)
        .await?
        .ok_or_else(aborted)?;

    let action = match &cli.tfaction {
        Some(action) => action.parse()?,
        None => selector.select_action().await?.ok_or_else(aborted)?,
    };

    Ok(Selection {
        workspace,
        modules,
        action,
        approval: ApprovalMode::Interactive {
            auto_approve: cli.approve,
        },
    })
}
