//! Fan-out of the module pipeline over a build request
//!
//! Sequential runs go left to right and stop at the first failed module.
//! Concurrent runs push every module through a semaphore-bounded pool, and a
//! failed module only affects its own outcome.

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::build::{Action, BuildRequest, ModuleRef};
use crate::config::DEFAULT_MAX_WORKERS;
use crate::error::StageFailure;
use crate::runner::{ModuleCompletion, ModuleRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failed,
    Aborted,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Result of one module's pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub module: ModuleRef,
    pub status: OutcomeStatus,
    pub detail: Option<String>,
}

impl RunOutcome {
    fn from_result(module: &ModuleRef, result: Result<ModuleCompletion, StageFailure>) -> Self {
        match result {
            Ok(ModuleCompletion::Succeeded) => Self {
                module: module.clone(),
                status: OutcomeStatus::Success,
                detail: None,
            },
            Ok(ModuleCompletion::UserAborted) => Self {
                module: module.clone(),
                status: OutcomeStatus::Aborted,
                detail: Some("apply declined by operator".to_string()),
            },
            Err(failure) => Self {
                module: module.clone(),
                status: OutcomeStatus::Failed,
                detail: Some(failure.to_string()),
            },
        }
    }
}

/// Outcomes of a whole run, in request order for sequential runs and in
/// submission order for concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<RunOutcome>,
    /// A sequential run stopped at a failure
    pub halted: bool,
    /// Modules never attempted because the run halted
    pub skipped: Vec<ModuleRef>,
}

impl RunReport {
    pub fn failures(&self) -> Vec<&RunOutcome> {
        self.with_status(OutcomeStatus::Failed)
    }

    pub fn succeeded(&self) -> Vec<&RunOutcome> {
        self.with_status(OutcomeStatus::Success)
    }

    pub fn aborted(&self) -> Vec<&RunOutcome> {
        self.with_status(OutcomeStatus::Aborted)
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.status == OutcomeStatus::Failed)
    }

    /// No module failed. Declined confirmations do not count as failures.
    pub fn is_success(&self) -> bool {
        !self.has_failures() && !self.halted
    }

    pub fn outcome(&self, module: &ModuleRef) -> Option<&RunOutcome> {
        self.outcomes.iter().find(|outcome| &outcome.module == module)
    }

    fn with_status(&self, status: OutcomeStatus) -> Vec<&RunOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .collect()
    }

    /// Operator-facing summary, one line per module that did not succeed
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} succeeded, {} failed, {} aborted, {} not attempted",
            self.succeeded().len(),
            self.failures().len(),
            self.aborted().len(),
            self.skipped.len()
        )];
        for outcome in self.failures() {
            lines.push(format!(
                "  FAILED  {}: {}",
                outcome.module,
                outcome.detail.as_deref().unwrap_or("unknown error")
            ));
        }
        for outcome in self.aborted() {
            lines.push(format!("  ABORTED {}", outcome.module));
        }
        for module in &self.skipped {
            lines.push(format!("  SKIPPED {module}"));
        }
        lines.join("\n")
    }
}

/// Module start banner
pub fn banner(action: Action, module: &ModuleRef) -> String {
    let rule = "*".repeat(76);
    format!("\n{rule}\nPerforming action \"{action}\" for module {module}\n{rule}\n")
}

pub struct Orchestrator {
    runner: ModuleRunner,
    max_workers: usize,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(runner: ModuleRunner) -> Self {
        let max_workers = runner.settings().max_workers;
        Self {
            runner,
            max_workers,
            show_progress: true,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = if max_workers == 0 {
            DEFAULT_MAX_WORKERS
        } else {
            max_workers
        };
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run(&self, request: &BuildRequest) -> RunReport {
        info!(
            "Running {} on {} module(s) in workspace {} ({})",
            request.action(),
            request.modules().len(),
            request.workspace().name,
            if request.concurrent() { "concurrent" } else { "sequential" }
        );

        if request.concurrent() {
            self.run_concurrent(request).await
        } else {
            self.run_sequential(request).await
        }
    }

    async fn run_sequential(&self, request: &BuildRequest) -> RunReport {
        let mut report = RunReport::default();
        let modules = request.modules();

        for (index, module) in modules.iter().enumerate() {
            println!("{}", banner(request.action(), module));
            let outcome = RunOutcome::from_result(module, self.runner.run(module, request).await);

            if outcome.status == OutcomeStatus::Failed {
                error!(
                    "{}: Error aborting... {}",
                    module.name(),
                    outcome.detail.as_deref().unwrap_or_default()
                );
                report.outcomes.push(outcome);
                report.halted = true;
                report.skipped = modules[index + 1..].to_vec();
                break;
            }
            report.outcomes.push(outcome);
        }

        report
    }

    async fn run_concurrent(&self, request: &BuildRequest) -> RunReport {
        let modules = request.modules();
        debug!("Using parallelism level: {}", self.max_workers);

        let progress = if self.show_progress {
            create_progress_bar(modules.len())
        } else {
            ProgressBar::hidden()
        };
        progress.set_message(format!("{} modules", request.action()));

        let semaphore = Semaphore::new(self.max_workers);
        let futures = modules.iter().map(|module| {
            let semaphore = &semaphore;
            let progress = progress.clone();
            async move {
                // The semaphore is never closed, so a permit always arrives
                let _permit = semaphore.acquire().await.ok();
                progress.println(banner(request.action(), module));
                let result = self.runner.run(module, request).await;
                progress.inc(1);

                if let Err(failure) = &result {
                    error!("{} generated an error: {}", module, failure);
                }
                RunOutcome::from_result(module, result)
            }
        });

        let outcomes = join_all(futures).await;
        let report = RunReport {
            outcomes,
            halted: false,
            skipped: Vec::new(),
        };

        progress.finish_with_message(format!(
            "Completed: {} successful, {} failed",
            report.succeeded().len(),
            report.failures().len()
        ));
        report
    }
}

fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}
