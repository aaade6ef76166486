//! Scripted prompter for tests and unattended rehearsals

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::prompts::{ChoiceInput, UserPrompter, UserPrompterImpl};
use crate::error::{Error, Result};

/// Answers prompts from a fixed script, in order, and records every question.
///
/// Answers are interpreted exactly like operator input: `y`/`yes` confirm,
/// choice answers are 1-based indices and an empty answer or `q` aborts.
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    responses: Arc<Mutex<VecDeque<String>>>,
    asked: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Into::into).collect())),
            asked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every prompt message seen so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|asked| asked.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn next(&self, message: &str) -> Result<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(message.to_string());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .ok_or_else(|| Error::Validation(format!("no scripted response for '{message}'")))
    }

    fn choices(&self, message: &str, count: usize, multiple: bool) -> Result<Option<Vec<usize>>> {
        let response = self.next(message)?;
        match UserPrompterImpl::parse_choice_input(&response, count, multiple) {
            ChoiceInput::Quit => Ok(None),
            ChoiceInput::Selected(indices) => Ok(Some(indices)),
            ChoiceInput::Invalid => Err(Error::Validation(format!(
                "scripted response '{response}' is not a valid choice"
            ))),
        }
    }
}

#[async_trait]
impl UserPrompter for ScriptedPrompter {
    async fn prompt_yes_no(&self, message: &str) -> Result<bool> {
        Ok(UserPrompterImpl::is_affirmative(&self.next(message)?))
    }

    async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<Option<usize>> {
        Ok(self
            .choices(message, choices.len(), false)?
            .and_then(|indices| indices.first().copied()))
    }

    async fn prompt_multi_choice(
        &self,
        message: &str,
        choices: &[String],
    ) -> Result<Option<Vec<usize>>> {
        self.choices(message, choices.len(), true)
    }
}
