use std::sync::Arc;
use tracing::debug;

use crate::build::{Action, ModuleRef};
use crate::config::WorkspaceCatalog;
use crate::error::{Error, Result};
use crate::interaction::UserPrompter;

/// Guided selection of workspace, modules and action.
///
/// Every method returns `Ok(None)` when the operator aborts the prompt.
pub struct InteractiveSelector {
    prompter: Arc<dyn UserPrompter>,
}

impl InteractiveSelector {
    pub fn new(prompter: Arc<dyn UserPrompter>) -> Self {
        Self { prompter }
    }

    pub async fn select_workspace(&self, catalog: &WorkspaceCatalog) -> Result<Option<String>> {
        let names = catalog.names();
        if names.is_empty() {
            return Err(Error::Config("no workspaces are defined".to_string()));
        }

        let choice = self
            .prompter
            .prompt_choice("Select the workspace to build:", &catalog.choices())
            .await?;
        Ok(choice.and_then(|index| names.get(index).cloned()))
    }

    pub async fn select_modules(&self, candidates: &[ModuleRef]) -> Result<Option<Vec<ModuleRef>>> {
        if candidates.is_empty() {
            return Err(Error::Validation("no modules found to select from".to_string()));
        }

        let labels: Vec<String> = candidates.iter().map(|m| m.to_string()).collect();
        let Some(indices) = self
            .prompter
            .prompt_multi_choice("Select the module(s) to build:", &labels)
            .await?
        else {
            return Ok(None);
        };

        let selected: Vec<ModuleRef> = indices
            .into_iter()
            .filter_map(|index| candidates.get(index).cloned())
            .collect();
        debug!("Selected {} module(s)", selected.len());
        Ok(Some(selected))
    }

    pub async fn select_action(&self) -> Result<Option<Action>> {
        let labels: Vec<String> = Action::ALL.iter().map(|a| a.to_string()).collect();
        let choice = self
            .prompter
            .prompt_choice("Select the terraform action:", &labels)
            .await?;
        Ok(choice.and_then(|index| Action::ALL.get(index).copied()))
    }
}
