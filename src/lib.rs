//! # tfrun
//!
//! Pick terraform modules and a workspace, then plan or apply every module,
//! one after another or over a bounded worker pool.
//!
//! ## Usage
//!
//! ```bash
//! tfrun                                  # interactive
//! tfrun -d -w dev -t apply               # deploy manifest
//! tfrun -o gitops.yaml                   # gitops manifest
//! tfrun -b feature/sg -k "$GITLAB_TOKEN" # merge-request diff
//! tfrun -m main/storage/s3 -w dev -t plan -c
//! ```
//!
//! ## Modules
//!
//! - `build` - Module references, actions and the assembled build request
//! - `cli` - Argument parsing and mode routing
//! - `config` - Settings and workspace metadata
//! - `interaction` - Operator prompts behind a trait
//! - `orchestrator` - Sequential and concurrent fan-out with run reports
//! - `runner` - Per-module terraform pipeline
//! - `selector` - Interactive, manifest, diff and explicit module selection
//! - `subprocess` - Subprocess abstraction layer for testing
//! - `vcs` - Merge-request diffs from GitLab
pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod interaction;
pub mod orchestrator;
pub mod runner;
pub mod selector;
pub mod subprocess;
pub mod vcs;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
