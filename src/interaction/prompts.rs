//! User prompting implementation

use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::task;

use crate::error::{Error, Result};

/// Trait for user prompting
///
/// Choice prompts return `Ok(None)` when the operator gives an empty answer
/// or `q`; callers treat that as an abort, not an error.
#[async_trait]
pub trait UserPrompter: Send + Sync {
    /// Prompt for yes/no confirmation, defaulting to no
    async fn prompt_yes_no(&self, message: &str) -> Result<bool>;

    /// Prompt for one choice from a list, returning its index
    async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<Option<usize>>;

    /// Prompt for any number of choices, returning their indices in the order given
    async fn prompt_multi_choice(
        &self,
        message: &str,
        choices: &[String],
    ) -> Result<Option<Vec<usize>>>;
}

type LineReader = Arc<dyn Fn() -> io::Result<String> + Send + Sync>;

/// Real implementation of user prompter reading from stdin
///
/// Lines are read on the blocking pool, so a module waiting for an answer
/// does not hold up modules running beside it.
pub struct UserPrompterImpl {
    read: LineReader,
}

impl Default for UserPrompterImpl {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed answer to a choice prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceInput {
    Quit,
    Selected(Vec<usize>),
    Invalid,
}

impl UserPrompterImpl {
    pub fn new() -> Self {
        Self::with_reader(|| {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            Ok(input)
        })
    }

    /// Prompter reading answers from `reader` instead of stdin
    pub fn with_reader<F>(reader: F) -> Self
    where
        F: Fn() -> io::Result<String> + Send + Sync + 'static,
    {
        Self {
            read: Arc::new(reader),
        }
    }

    async fn read_line(&self) -> Result<String> {
        let read = Arc::clone(&self.read);
        let input = task::spawn_blocking(move || read())
            .await
            .map_err(io::Error::other)??;
        Ok(input.trim().to_string())
    }

    /// Interpret yes/no input; anything but `y`/`yes` is a no
    pub fn is_affirmative(input: &str) -> bool {
        matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
    }

    /// Validate choice input of one or more 1-based indices separated by
    /// commas or whitespace. Indices are returned 0-based, duplicates dropped.
    pub fn parse_choice_input(input: &str, num_choices: usize, multiple: bool) -> ChoiceInput {
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("q") {
            return ChoiceInput::Quit;
        }
        if num_choices == 0 {
            return ChoiceInput::Invalid;
        }

        let mut selected = Vec::new();
        for token in input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            match token.parse::<usize>() {
                Ok(num) if num > 0 && num <= num_choices => {
                    if !selected.contains(&(num - 1)) {
                        selected.push(num - 1);
                    }
                }
                _ => return ChoiceInput::Invalid,
            }
        }

        if selected.is_empty() || (!multiple && selected.len() > 1) {
            return ChoiceInput::Invalid;
        }
        ChoiceInput::Selected(selected)
    }

    /// Format choice prompt message
    pub fn format_choice_prompt(message: &str, choices: &[String]) -> String {
        let mut output = String::new();
        output.push_str(message);
        output.push('\n');
        for (i, choice) in choices.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, choice));
        }
        output
    }

    pub fn format_choice_input_prompt(num_choices: usize, multiple: bool) -> String {
        if multiple {
            format!("Enter choices (1-{num_choices}, comma separated, q to quit): ")
        } else {
            format!("Enter choice (1-{num_choices}, q to quit): ")
        }
    }

    pub fn format_invalid_choice_message(num_choices: usize) -> String {
        format!("Invalid choice. Please enter numbers between 1 and {num_choices}: ")
    }

    async fn ask(
        &self,
        message: &str,
        choices: &[String],
        multiple: bool,
    ) -> Result<Option<Vec<usize>>> {
        if choices.is_empty() {
            return Err(Error::Validation("No choices provided".to_string()));
        }

        print!("{}", Self::format_choice_prompt(message, choices));
        print!("{}", Self::format_choice_input_prompt(choices.len(), multiple));
        io::stdout().flush()?;

        loop {
            let input = self.read_line().await?;
            match Self::parse_choice_input(&input, choices.len(), multiple) {
                ChoiceInput::Quit => return Ok(None),
                ChoiceInput::Selected(indices) => return Ok(Some(indices)),
                ChoiceInput::Invalid => {
                    print!("{}", Self::format_invalid_choice_message(choices.len()));
                    io::stdout().flush()?;
                }
            }
        }
    }
}

#[async_trait]
impl UserPrompter for UserPrompterImpl {
    async fn prompt_yes_no(&self, message: &str) -> Result<bool> {
        print!("{message} [y/N]: ");
        io::stdout().flush()?;

        let input = self.read_line().await?;
        Ok(Self::is_affirmative(&input))
    }

    async fn prompt_choice(&self, message: &str, choices: &[String]) -> Result<Option<usize>> {
        Ok(self
            .ask(message, choices, false)
            .await?
            .and_then(|indices| indices.first().copied()))
    }

    async fn prompt_multi_choice(
        &self,
        message: &str,
        choices: &[String],
    ) -> Result<Option<Vec<usize>>> {
        self.ask(message, choices, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(UserPrompterImpl::is_affirmative("y"));
        assert!(UserPrompterImpl::is_affirmative("YES"));
        assert!(UserPrompterImpl::is_affirmative(" yes "));
        assert!(!UserPrompterImpl::is_affirmative(""));
        assert!(!UserPrompterImpl::is_affirmative("n"));
        assert!(!UserPrompterImpl::is_affirmative("yep"));
    }

    #[test]
    fn test_parse_choice_input_single() {
        assert_eq!(
            UserPrompterImpl::parse_choice_input("1", 3, false),
            ChoiceInput::Selected(vec![0])
        );
        assert_eq!(
            UserPrompterImpl::parse_choice_input("3", 3, false),
            ChoiceInput::Selected(vec![2])
        );
        assert_eq!(
            UserPrompterImpl::parse_choice_input("1,2", 3, false),
            ChoiceInput::Invalid
        );
    }

    #[test]
    fn test_parse_choice_input_multiple() {
        assert_eq!(
            UserPrompterImpl::parse_choice_input("3, 1 2", 3, true),
            ChoiceInput::Selected(vec![2, 0, 1])
        );
        assert_eq!(
            UserPrompterImpl::parse_choice_input("2,2", 3, true),
            ChoiceInput::Selected(vec![1])
        );
    }

    #[test]
    fn test_parse_choice_input_quit() {
        assert_eq!(UserPrompterImpl::parse_choice_input("", 3, true), ChoiceInput::Quit);
        assert_eq!(UserPrompterImpl::parse_choice_input("  ", 3, false), ChoiceInput::Quit);
        assert_eq!(UserPrompterImpl::parse_choice_input("Q", 3, false), ChoiceInput::Quit);
    }

    #[test]
    fn test_parse_choice_input_invalid() {
        assert_eq!(UserPrompterImpl::parse_choice_input("0", 3, false), ChoiceInput::Invalid);
        assert_eq!(UserPrompterImpl::parse_choice_input("4", 3, false), ChoiceInput::Invalid);
        assert_eq!(UserPrompterImpl::parse_choice_input("-1", 3, true), ChoiceInput::Invalid);
        assert_eq!(UserPrompterImpl::parse_choice_input("1,x", 3, true), ChoiceInput::Invalid);
        assert_eq!(UserPrompterImpl::parse_choice_input("1", 0, true), ChoiceInput::Invalid);
    }

    #[test]
    fn test_format_choice_prompt() {
        let choices = vec!["Option A".to_string(), "Option B".to_string()];
        let formatted = UserPrompterImpl::format_choice_prompt("Choose an option:", &choices);
        assert_eq!(formatted, "Choose an option:\n  1. Option A\n  2. Option B\n");
    }

    #[test]
    fn test_format_choice_input_prompt() {
        assert_eq!(
            UserPrompterImpl::format_choice_input_prompt(3, false),
            "Enter choice (1-3, q to quit): "
        );
        assert_eq!(
            UserPrompterImpl::format_choice_input_prompt(10, true),
            "Enter choices (1-10, comma separated, q to quit): "
        );
    }

    #[tokio::test]
    async fn test_prompt_choice_empty_choices() {
        let prompter = UserPrompterImpl::new();
        let result = prompter.prompt_choice("Choose", &[]).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    fn answering(lines: &[&str]) -> UserPrompterImpl {
        let lines = std::sync::Mutex::new(
            lines
                .iter()
                .map(|line| format!("{line}\n"))
                .collect::<std::collections::VecDeque<_>>(),
        );
        UserPrompterImpl::with_reader(move || {
            Ok(lines.lock().unwrap().pop_front().unwrap_or_default())
        })
    }

    #[tokio::test]
    async fn test_prompt_yes_no_reads_from_reader() {
        let prompter = answering(&["y", "", "nope"]);
        assert!(prompter.prompt_yes_no("Apply?").await.unwrap());
        assert!(!prompter.prompt_yes_no("Apply?").await.unwrap());
        assert!(!prompter.prompt_yes_no("Apply?").await.unwrap());
    }

    #[tokio::test]
    async fn test_prompt_choice_retries_invalid_input() {
        let prompter = answering(&["7", "x", "2"]);
        let choices = vec!["dev".to_string(), "sre".to_string()];
        assert_eq!(prompter.prompt_choice("Workspace", &choices).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_prompt_multi_choice_quit() {
        let prompter = answering(&["q"]);
        let choices = vec!["a".to_string(), "b".to_string()];
        assert_eq!(prompter.prompt_multi_choice("Modules", &choices).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reader_error_is_io_error() {
        let prompter = UserPrompterImpl::with_reader(|| Err(io::Error::other("closed")));
        assert!(matches!(prompter.prompt_yes_no("Apply?").await, Err(Error::Io(_))));
    }
}
