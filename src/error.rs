use std::fmt;
use thiserror::Error;

use crate::build::{Action, ModuleRef};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Stage(#[from] StageFailure),

    #[error("Diff error: {0}")]
    Diff(String),

    #[error("User aborted: {0}")]
    Aborted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage a module was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reset,
    ConfigStaged,
    Initialized,
    Planned,
    Confirm,
    Applied,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Reset => "reset",
            Stage::ConfigStaged => "stage-config",
            Stage::Initialized => "init",
            Stage::Planned => "plan",
            Stage::Confirm => "confirm",
            Stage::Applied => "apply",
        };
        f.write_str(name)
    }
}

/// A module pipeline stopped because an external command or filesystem step
/// failed.
#[derive(Error, Debug, Clone)]
#[error("{module}: {stage} failed while running {action}: {reason}")]
pub struct StageFailure {
    pub module: ModuleRef,
    pub action: Action,
    pub stage: Stage,
    pub reason: String,
}

impl StageFailure {
    pub fn new(
        module: &ModuleRef,
        action: Action,
        stage: Stage,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            module: module.clone(),
            action,
            stage,
            reason: reason.into(),
        }
    }
}
