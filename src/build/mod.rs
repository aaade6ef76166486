//! Core build vocabulary: module references, actions and the assembled
//! [`BuildRequest`].

pub mod request;

pub use request::{ApprovalMode, BuildRequest};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

/// Path-like identifier of a terraform module, e.g. `./main/networking/security-groups`.
///
/// Stored with a leading `./` so `main/x`, `./main/x` and `./main/x/` all
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ModuleRef(String);

impl ModuleRef {
    pub fn new(path: impl AsRef<str>) -> Self {
        let trimmed = path.as_ref().trim().trim_end_matches('/');
        let relative = trimmed.trim_start_matches("./");
        if Path::new(relative).is_absolute() {
            Self(relative.to_string())
        } else {
            Self(format!("./{relative}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path without the leading `./`
    pub fn relative_path(&self) -> &str {
        self.0.strip_prefix("./").unwrap_or(&self.0)
    }

    /// Module name used for the state key: last path segment up to the first `.`
    pub fn name(&self) -> &str {
        let last = self.0.rsplit('/').next().unwrap_or(&self.0);
        last.split('.').next().unwrap_or(last)
    }

    /// Directory of this module under the repository root
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ModuleRef {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&str> for ModuleRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<ModuleRef> for String {
    fn from(module: ModuleRef) -> Self {
        module.0
    }
}

/// Terraform action applied to every module of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Plan,
    PlanDestroy,
    Apply,
    ApplyDestroy,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Plan,
        Action::Apply,
        Action::PlanDestroy,
        Action::ApplyDestroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Plan => "plan",
            Action::PlanDestroy => "plan-destroy",
            Action::Apply => "apply",
            Action::ApplyDestroy => "apply-destroy",
        }
    }

    /// Whether the plan is a destroy plan
    pub fn is_destroy(&self) -> bool {
        matches!(self, Action::PlanDestroy | Action::ApplyDestroy)
    }

    /// Whether the pipeline continues past the plan stage into apply
    pub fn applies(&self) -> bool {
        matches!(self, Action::Apply | Action::ApplyDestroy)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "plan" => Ok(Action::Plan),
            "plan-destroy" => Ok(Action::PlanDestroy),
            "apply" => Ok(Action::Apply),
            "apply-destroy" => Ok(Action::ApplyDestroy),
            other => Err(Error::Validation(format!(
                "unknown terraform action '{other}' (expected plan, apply, plan-destroy or apply-destroy)"
            ))),
        }
    }
}
