//! Per-module build pipeline
//!
//! `reset -> stage shared config -> init -> plan -> (confirm) -> apply`, stopping
//! at the first failing stage. Failures are returned as [`StageFailure`] and
//! never end the process; deciding what a failure means for the run is the
//! orchestrator's job.

pub mod staging;
pub mod terraform;

pub use terraform::TerraformCommands;

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::build::{Action, BuildRequest, ModuleRef};
use crate::config::Settings;
use crate::error::{Stage, StageFailure};
use crate::interaction::UserPrompter;
use crate::subprocess::ProcessRunner;

/// How a module pipeline ended when no stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleCompletion {
    Succeeded,
    /// The operator declined the apply confirmation
    UserAborted,
}

pub struct ModuleRunner {
    settings: Settings,
    process: Arc<dyn ProcessRunner>,
    prompter: Arc<dyn UserPrompter>,
    prompt_lock: Mutex<()>,
}

/// Confirmation question asked before applying `module`
pub fn confirmation_message(action: Action, module: &ModuleRef) -> String {
    if action.is_destroy() {
        format!("Sure you want to APPLY DESTROY {}", module.name())
    } else {
        format!("Sure you want to APPLY {}", module.name())
    }
}

struct Step<'a> {
    module: &'a ModuleRef,
    action: Action,
    commands: TerraformCommands,
}

impl Step<'_> {
    fn failure(&self, stage: Stage, reason: impl Into<String>) -> StageFailure {
        StageFailure::new(self.module, self.action, stage, reason)
    }
}

impl ModuleRunner {
    pub fn new(
        settings: Settings,
        process: Arc<dyn ProcessRunner>,
        prompter: Arc<dyn UserPrompter>,
    ) -> Self {
        Self {
            settings,
            process,
            prompter,
            prompt_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the whole pipeline for one module of `request`
    pub async fn run(
        &self,
        module: &ModuleRef,
        request: &BuildRequest,
    ) -> Result<ModuleCompletion, StageFailure> {
        let root = &self.settings.root;
        let module_dir = module.resolve(root);
        let step = Step {
            module,
            action: request.action(),
            commands: TerraformCommands::new(
                self.settings.terraform_bin.clone(),
                module_dir.clone(),
                self.settings.region.clone(),
            )
            .automation(!request.interactive()),
        };

        debug!("Resetting {}", module);
        staging::reset_module(&module_dir, &self.settings.plan_file)
            .await
            .map_err(|e| step.failure(Stage::Reset, e.to_string()))?;

        debug!("Staging shared configuration into {}", module);
        self.stage_config(module)
            .await
            .map_err(|e| step.failure(Stage::ConfigStaged, e.to_string()))?;

        let workspace = request.workspace();
        self.exec(
            &step,
            Stage::Initialized,
            TerraformCommands::build_init_args(module, workspace),
        )
        .await?;
        self.select_workspace(&step, &workspace.name).await?;

        self.exec(
            &step,
            Stage::Planned,
            TerraformCommands::build_plan_args(
                step.action.is_destroy(),
                &self.settings.plan_file,
            ),
        )
        .await?;

        if !step.action.applies() {
            info!("Module {} planned successfully", module.name());
            return Ok(ModuleCompletion::Succeeded);
        }

        if !request.auto_approve() && !self.confirm(&step).await? {
            println!("User aborting {}...", module.name());
            return Ok(ModuleCompletion::UserAborted);
        }

        self.exec(
            &step,
            Stage::Applied,
            TerraformCommands::build_apply_args(&self.settings.plan_file),
        )
        .await?;

        info!("Module {} ran successfully", module.name());
        Ok(ModuleCompletion::Succeeded)
    }

    async fn stage_config(&self, module: &ModuleRef) -> std::io::Result<()> {
        let root = &self.settings.root;
        staging::copy_overrides(
            &self.settings.path(&self.settings.override_dir),
            &self.settings.override_files,
            &module.resolve(root),
        )
        .await?;
        staging::link_shared_files(
            root,
            Path::new(module.relative_path()),
            &self.settings.variables_dir,
            &self.settings.linked_files,
        )
        .await
    }

    /// `workspace select`, creating the workspace when it does not exist yet
    async fn select_workspace(
        &self,
        step: &Step<'_>,
        workspace: &str,
    ) -> Result<(), StageFailure> {
        let select = TerraformCommands::build_workspace_select_args(workspace);
        if self.exec(step, Stage::Initialized, select).await.is_ok() {
            return Ok(());
        }

        warn!("Workspace {} not selectable in {}, creating it", workspace, step.module);
        self.exec(
            step,
            Stage::Initialized,
            TerraformCommands::build_workspace_new_args(workspace),
        )
        .await
    }

    async fn confirm(&self, step: &Step<'_>) -> Result<bool, StageFailure> {
        // One question on screen at a time, even with concurrent modules
        let _guard = self.prompt_lock.lock().await;
        self.prompter
            .prompt_yes_no(&confirmation_message(step.action, step.module))
            .await
            .map_err(|e| step.failure(Stage::Confirm, e.to_string()))
    }

    async fn exec(
        &self,
        step: &Step<'_>,
        stage: Stage,
        args: Vec<String>,
    ) -> Result<(), StageFailure> {
        let command = step.commands.command(args);
        let shown = command.display();
        debug!("Running `{}` in {}", shown, step.commands.work_dir().display());

        let output = self
            .process
            .run(command)
            .await
            .map_err(|e| step.failure(stage, format!("`{shown}` could not run: {e}")))?;

        if output.status.success() {
            return Ok(());
        }

        let status = match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        };
        Err(step.failure(stage, format!("`{shown}` ended with {status}")))
    }
}
