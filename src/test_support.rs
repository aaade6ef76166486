//! Shared fixtures for pipeline and orchestrator tests

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use crate::build::{Action, ApprovalMode, BuildRequest, ModuleRef};
use crate::config::{Settings, Workspace};
use crate::interaction::{ScriptedPrompter, UserPrompter};
use crate::runner::ModuleRunner;
use crate::subprocess::{MockProcessRunner, ProcessRunner};

/// Temporary infrastructure repository with shared variable files and the
/// given module directories.
pub struct RepoFixture {
    pub dir: TempDir,
    pub settings: Settings,
}

impl RepoFixture {
    pub fn with_modules(modules: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("variables/config")).unwrap();
        for file in ["backend_override.tf", "providers_override.tf"] {
            fs::write(root.join("variables/config").join(file), "# override\n").unwrap();
        }
        for file in ["_accounts.tf", "_backend.tf", "_envs.tf", "_providers.tf"] {
            fs::write(root.join("variables").join(file), "# shared\n").unwrap();
        }
        for module in modules {
            let path = ModuleRef::new(module).resolve(root);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("main.tf"), "# module\n").unwrap();
        }

        let settings = Settings {
            root: root.to_path_buf(),
            ..Settings::default()
        };
        Self { dir, settings }
    }

    pub fn runner(&self, process: &MockProcessRunner, prompter: &ScriptedPrompter) -> ModuleRunner {
        self.runner_with(Arc::new(process.clone()), Arc::new(prompter.clone()))
    }

    pub fn runner_with(
        &self,
        process: Arc<dyn ProcessRunner>,
        prompter: Arc<dyn UserPrompter>,
    ) -> ModuleRunner {
        ModuleRunner::new(self.settings.clone(), process, prompter)
    }
}

pub fn dev_workspace() -> Workspace {
    Workspace {
        name: "dev".to_string(),
        account_id: "111111111111".to_string(),
        account: "development".to_string(),
        region: "eu-west-2".to_string(),
        bucket: "acme-tf-state-dev".to_string(),
        lock_table: "acme-tf-locks-dev".to_string(),
    }
}

pub fn request(
    modules: &[&str],
    action: Action,
    approval: ApprovalMode,
    concurrent: bool,
) -> BuildRequest {
    BuildRequest::assemble(
        dev_workspace(),
        modules.iter().map(ModuleRef::new).collect(),
        action,
        approval,
        concurrent,
    )
    .unwrap()
}

/// Arguments of every recorded terraform call, in call order
pub fn terraform_calls(process: &MockProcessRunner) -> Vec<Vec<String>> {
    process
        .get_call_history()
        .into_iter()
        .map(|command| command.args)
        .collect()
}

/// Expect every terraform call to succeed
pub fn terraform_succeeds(process: &mut MockProcessRunner) {
    process.expect_command("terraform").returns_success().finish();
}

/// Make `terraform init` fail for the module whose directory ends in `module`
pub fn init_fails_for(process: &mut MockProcessRunner, module: &str) {
    process
        .expect_command("terraform")
        .in_dir(module)
        .with_args(|args| args.first().map(String::as_str) == Some("init"))
        .returns_exit_code(1)
        .finish();
}
