//! Terminal prompts.

use std::io::{self, BufRead, Write};

use console::style;
use vership_core::{CoreError, CoreResult, Prompter};

/// [`Prompter`] reading answers from standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    /// Shows a numbered list and accepts a 1-based index. Enter picks the
    /// first choice.
    fn select(&self, message: &str, choices: &[String]) -> CoreResult<usize> {
        println!("\n{}", style(message).bold());
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}. {choice}", i + 1);
        }

        let answer = read_answer(&format!("\nSelect (1-{}) [default: 1]: ", choices.len()))?;
        parse_selection(&answer, choices.len())
    }

    fn input(&self, message: &str) -> CoreResult<String> {
        read_answer(&format!("{}: ", style(message).bold()))
    }
}

fn read_answer(prompt: &str) -> CoreResult<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Err(CoreError::Prompt("standard input is closed".to_string()));
    }
    Ok(input.trim().to_string())
}

fn parse_selection(answer: &str, count: usize) -> CoreResult<usize> {
    if answer.is_empty() {
        return Ok(0);
    }
    match answer.parse::<usize>() {
        Ok(index) if (1..=count).contains(&index) => Ok(index - 1),
        _ => Err(CoreError::Prompt(format!("invalid selection {answer:?}"))),
    }
}
