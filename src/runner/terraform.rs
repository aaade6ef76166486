//! Terraform command lines for one module directory

use std::path::{Path, PathBuf};

use crate::build::ModuleRef;
use crate::config::Workspace;
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};

/// Builds terraform invocations for a single module.
///
/// Every command runs inside the module directory, streams its output to the
/// operator and carries `REGION`; non-interactive runs also set
/// `TF_IN_AUTOMATION=1`.
pub struct TerraformCommands {
    bin: String,
    work_dir: PathBuf,
    region: String,
    automation: bool,
}

impl TerraformCommands {
    pub fn new(bin: impl Into<String>, work_dir: PathBuf, region: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            work_dir,
            region: region.into(),
            automation: false,
        }
    }

    pub fn automation(mut self, automation: bool) -> Self {
        self.automation = automation;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Arguments for `terraform init` against the workspace's state backend.
    ///
    /// The state key is `<module name>/terraform.tfstate`.
    pub fn build_init_args(module: &ModuleRef, workspace: &Workspace) -> Vec<String> {
        vec![
            "init".into(),
            format!("--backend-config=key={}/terraform.tfstate", module.name()),
            format!("--backend-config=region={}", workspace.region),
            format!("--backend-config=dynamodb_table={}", workspace.lock_table),
            format!("--backend-config=bucket={}", workspace.bucket),
        ]
    }

    pub fn build_workspace_select_args(workspace: &str) -> Vec<String> {
        vec!["workspace".into(), "select".into(), workspace.into()]
    }

    pub fn build_workspace_new_args(workspace: &str) -> Vec<String> {
        vec!["workspace".into(), "new".into(), workspace.into()]
    }

    pub fn build_plan_args(destroy: bool, plan_file: &str) -> Vec<String> {
        let mut args = vec!["plan".into()];
        if destroy {
            args.push("-destroy".into());
        }
        args.push("-out".into());
        args.push(plan_file.into());
        args
    }

    /// Apply a saved plan; terraform does not prompt again for a plan file
    pub fn build_apply_args(plan_file: &str) -> Vec<String> {
        vec!["apply".into(), plan_file.into()]
    }

    /// Wrap `args` into a command for this module
    pub fn command(&self, args: Vec<String>) -> ProcessCommand {
        let mut builder = ProcessCommandBuilder::new(&self.bin)
            .args(args)
            .current_dir(&self.work_dir)
            .env("REGION", &self.region)
            .inherit_output(true);
        if self.automation {
            builder = builder.env("TF_IN_AUTOMATION", "1");
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace {
            name: "dev".to_string(),
            account_id: "111111111111".to_string(),
            account: "development".to_string(),
            region: "eu-west-1".to_string(),
            bucket: "acme-tf-state-dev".to_string(),
            lock_table: "acme-tf-locks-dev".to_string(),
        }
    }

    #[test]
    fn test_init_args_use_module_name_as_state_key() {
        let module = ModuleRef::new("./main/networking/security-groups");
        assert_eq!(
            TerraformCommands::build_init_args(&module, &workspace()),
            vec![
                "init",
                "--backend-config=key=security-groups/terraform.tfstate",
                "--backend-config=region=eu-west-1",
                "--backend-config=dynamodb_table=acme-tf-locks-dev",
                "--backend-config=bucket=acme-tf-state-dev",
            ]
        );
    }

    #[test]
    fn test_init_args_truncate_name_at_dot() {
        let module = ModuleRef::new("./main/dns/example.com");
        let args = TerraformCommands::build_init_args(&module, &workspace());
        assert_eq!(args[1], "--backend-config=key=example/terraform.tfstate");
    }

    #[test]
    fn test_workspace_args() {
        assert_eq!(
            TerraformCommands::build_workspace_select_args("dev"),
            vec!["workspace", "select", "dev"]
        );
        assert_eq!(
            TerraformCommands::build_workspace_new_args("dev"),
            vec!["workspace", "new", "dev"]
        );
    }

    #[test]
    fn test_plan_args() {
        assert_eq!(
            TerraformCommands::build_plan_args(false, "plan.out"),
            vec!["plan", "-out", "plan.out"]
        );
        assert_eq!(
            TerraformCommands::build_plan_args(true, "plan.out"),
            vec!["plan", "-destroy", "-out", "plan.out"]
        );
    }

    #[test]
    fn test_apply_args() {
        assert_eq!(
            TerraformCommands::build_apply_args("plan.out"),
            vec!["apply", "plan.out"]
        );
    }

    #[test]
    fn test_command_environment() {
        let commands =
            TerraformCommands::new("terraform", PathBuf::from("/repo/main/a"), "eu-west-2");
        let command = commands.command(vec!["plan".into()]);
        assert_eq!(command.program, "terraform");
        assert_eq!(command.working_dir, Some(PathBuf::from("/repo/main/a")));
        assert_eq!(command.env.get("REGION").map(String::as_str), Some("eu-west-2"));
        assert!(!command.env.contains_key("TF_IN_AUTOMATION"));
        assert!(command.inherit_output);

        let automated = TerraformCommands::new("tofu", PathBuf::from("/repo/main/a"), "eu-west-2")
            .automation(true)
            .command(vec!["plan".into()]);
        assert_eq!(automated.program, "tofu");
        assert_eq!(automated.env.get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
    }
}
