//! Subprocess abstraction layer
//!
//! Every terraform invocation goes through [`ProcessRunner`], so the module
//! pipeline can be exercised against [`MockProcessRunner`] in tests.

pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;

#[cfg(test)]
mod tests;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, TokioProcessRunner};

