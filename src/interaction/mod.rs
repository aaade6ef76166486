//! Operator interaction
//!
//! All questions go through the [`UserPrompter`] trait so that selection and
//! confirmation logic can be driven by a script in tests.

pub mod mocks;
pub mod prompts;

pub use mocks::ScriptedPrompter;
pub use prompts::{UserPrompter, UserPrompterImpl};
