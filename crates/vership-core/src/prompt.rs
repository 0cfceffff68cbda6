//! Interactive input used by manual version selection.

use crate::{CoreError, CoreResult};

/// Source of interactive answers.
pub trait Prompter: Send + Sync {
    /// Asks the user to pick one of `choices` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Prompt`] if no answer can be obtained.
    fn select(&self, message: &str, choices: &[String]) -> CoreResult<usize>;

    /// Asks for free text. An empty answer is returned as an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Prompt`] if no answer can be obtained.
    fn input(&self, message: &str) -> CoreResult<String>;
}

/// [`Prompter`] for unattended runs: every question is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn select(&self, message: &str, _choices: &[String]) -> CoreResult<usize> {
        Err(CoreError::Prompt(format!(
            "{message}: input required but prompting is disabled; pass --release-type or --bump-strategy auto"
        )))
    }

    fn input(&self, message: &str) -> CoreResult<String> {
        Err(CoreError::Prompt(format!(
            "{message}: input required but prompting is disabled"
        )))
    }
}
