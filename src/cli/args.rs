//! CLI argument structures

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::build::ModuleRef;
use crate::selector::parse_module_list;

/// Select terraform modules and plan or apply them against a workspace
#[derive(Parser, Debug, Default)]
#[command(name = "tfrun")]
#[command(
    about = "tfrun - Build terraform modules per workspace, interactively or from CI",
    long_about = None
)]
#[command(version)]
#[command(group(
    ArgGroup::new("source")
        .args(["deploy", "gitops", "branch", "modules", "prereq"])
        .multiple(false)
))]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Build the modules declared for the workspace in the deploy manifest
    #[arg(short = 'd', long, requires_all = ["tfaction", "workspace"])]
    pub deploy: bool,

    /// Build from a gitops manifest (defaults to gitops.yaml)
    #[arg(short = 'o', long, value_name = "FILE", num_args = 0..=1)]
    pub gitops: Option<Option<PathBuf>>,

    /// Merge request branch to compare against the base ref
    #[arg(short = 'b', long)]
    pub branch: Option<String>,

    /// GitLab access token used for the branch comparison
    #[arg(short = 'k', long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub key: Option<String>,

    /// Comma separated list of modules to build
    #[arg(short = 'm', long, value_name = "MODULES")]
    pub modules: Option<String>,

    /// Build the prerequisite base modules
    #[arg(short = 'p', long)]
    pub prereq: bool,

    /// Terraform action: plan, apply, plan-destroy or apply-destroy
    #[arg(short = 't', long)]
    pub tfaction: Option<String>,

    /// Workspace to build
    #[arg(short = 'w', long)]
    pub workspace: Option<String>,

    /// Apply without asking for confirmation
    #[arg(short = 'a', long)]
    pub approve: bool,

    /// Build modules concurrently
    #[arg(short = 'c', long)]
    pub concurrent: bool,

    /// Maximum number of modules built at once with --concurrent
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Infrastructure repository root (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Settings file (defaults to tfrun.toml in the root when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Region passed to terraform as REGION
    #[arg(long, env = "REGION")]
    pub region: Option<String>,
}

/// Where the module list of a run comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    Interactive,
    Deploy,
    Gitops(Option<PathBuf>),
    Diff { branch: String },
    Explicit(Vec<ModuleRef>),
    Prerequisites,
}

impl Cli {
    pub fn selection_mode(&self) -> SelectionMode {
        if self.deploy {
            SelectionMode::Deploy
        } else if let Some(file) = &self.gitops {
            SelectionMode::Gitops(file.clone())
        } else if let Some(branch) = &self.branch {
            SelectionMode::Diff {
                branch: branch.clone(),
            }
        } else if let Some(modules) = &self.modules {
            SelectionMode::Explicit(parse_module_list(modules))
        } else if self.prereq {
            SelectionMode::Prerequisites
        } else {
            SelectionMode::Interactive
        }
    }
}
