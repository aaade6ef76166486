use std::collections::HashSet;

use super::{Action, ModuleRef};
use crate::config::Workspace;
use crate::error::{Error, Result};

/// How confirmation before apply is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalMode {
    /// Operator at a terminal; their `--approve` flag is used verbatim
    Interactive { auto_approve: bool },
    /// Manifest, diff or CI driven; approval is always forced on
    NonInteractive,
}

impl ApprovalMode {
    pub fn auto_approve(&self) -> bool {
        match self {
            ApprovalMode::Interactive { auto_approve } => *auto_approve,
            ApprovalMode::NonInteractive => true,
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, ApprovalMode::Interactive { .. })
    }
}

/// Everything the orchestrator needs for one run.
///
/// Only constructed through [`BuildRequest::assemble`], which guarantees a
/// non-empty, de-duplicated module list.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    workspace: Workspace,
    modules: Vec<ModuleRef>,
    action: Action,
    auto_approve: bool,
    interactive: bool,
    concurrent: bool,
}

impl BuildRequest {
    pub fn assemble(
        workspace: Workspace,
        modules: Vec<ModuleRef>,
        action: Action,
        approval: ApprovalMode,
        concurrent: bool,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let modules: Vec<ModuleRef> = modules
            .into_iter()
            .filter(|module| seen.insert(module.clone()))
            .collect();

        if modules.is_empty() {
            return Err(Error::Validation(format!(
                "no modules left to {} in workspace '{}'",
                action, workspace.name
            )));
        }

        Ok(Self {
            workspace,
            modules,
            action,
            auto_approve: approval.auto_approve(),
            interactive: approval.is_interactive(),
            concurrent,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn auto_approve(&self) -> bool {
        self.auto_approve
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn concurrent(&self) -> bool {
        self.concurrent
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
            region: "eu-west-2".to_string(),
            bucket: "tf-state-dev".to_string(),
            lock_table: "tf-locks-dev".to_string(),
        }
    }

    #[test]
    fn test_assemble_rejects_empty_modules() {
        for approval in [
            ApprovalMode::NonInteractive,
            ApprovalMode::Interactive { auto_approve: true },
            ApprovalMode::Interactive {
                auto_approve: false,
            },
        ] {
            let result = BuildRequest::assemble(workspace(), vec![], Action::Plan, approval, false);
            assert!(matches!(result, Err(Error::Validation(_))));
        }
    }

    #[test]
    fn test_assemble_deduplicates_preserving_order() {
        let request = BuildRequest::assemble(
            workspace(),
            vec![
                ModuleRef::new("./main/b"),
                ModuleRef::new("main/a"),
                ModuleRef::new("./main/b/"),
                ModuleRef::new("./main/a"),
            ],
            Action::Plan,
            ApprovalMode::NonInteractive,
            false,
        )
        .unwrap();

        assert_eq!(
            request.modules(),
            &[ModuleRef::new("./main/b"), ModuleRef::new("./main/a")]
        );
    }

    #[test]
    fn test_non_interactive_forces_auto_approve() {
        let request = BuildRequest::assemble(
            workspace(),
            vec![ModuleRef::new("./main/a")],
            Action::Apply,
            ApprovalMode::NonInteractive,
            true,
        )
        .unwrap();

        assert!(request.auto_approve());
        assert!(!request.interactive());
        assert!(request.concurrent());
    }

    #[test]
    fn test_interactive_uses_caller_flag() {
        for flag in [true, false] {
            let request = BuildRequest::assemble(
                workspace(),
                vec![ModuleRef::new("./main/a")],
                Action::ApplyDestroy,
                ApprovalMode::Interactive { auto_approve: flag },
                false,
            )
            .unwrap();
            assert_eq!(request.auto_approve(), flag);
            assert!(request.interactive());
            assert_eq!(request.action(), Action::ApplyDestroy);
            assert_eq!(request.workspace().name, "dev");
        }
    }
}
