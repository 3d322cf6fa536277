//! Styled terminal messages.

use std::io::{BufRead, Write};

use anyhow::Result;
use crossterm::style::Stylize;

use super::prompt::Prompter;

const BOX_WIDTH: usize = 62;

/// Framed title shown at the top of a flow.
pub fn banner<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>, title: &str) -> Result<()> {
    let inner = BOX_WIDTH - 2;
    let padding = inner.saturating_sub(title.chars().count());
    let (left, right) = (padding / 2, padding - padding / 2);

    prompter.say("")?;
    prompter.say(format!("╔{}╗", "═".repeat(inner)).cyan().bold().to_string())?;
    prompter.say(
        format!("║{}{title}{}║", " ".repeat(left), " ".repeat(right))
            .cyan()
            .bold()
            .to_string(),
    )?;
    prompter.say(format!("╚{}╝", "═".repeat(inner)).cyan().bold().to_string())?;
    prompter.say("")
}

/// Green line prefixed with a check mark.
pub fn success<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>, message: &str) -> Result<()> {
    prompter.say(format!("✅  {message}").green().to_string())
}

/// Yellow warning line.
pub fn warning<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>, message: &str) -> Result<()> {
    prompter.say(format!("⚠️  {message}").yellow().to_string())
}

/// Red error line.
pub fn failure<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>, message: &str) -> Result<()> {
    prompter.say(format!("❌  {message}").red().to_string())
}

/// Cyan informational line.
pub fn info<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>, message: &str) -> Result<()> {
    prompter.say(message.cyan().to_string())
}

/// Dimmed secondary text.
pub fn dim<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>, message: &str) -> Result<()> {
    prompter.say(message.dim().to_string())
}

/// Prints an error with its cause chain.
pub fn report_error<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    error: &anyhow::Error,
) -> Result<()> {
    failure(prompter, &format!("{error:#}"))
}

/// Numbered list of pinned branches, or a hint when there are none.
pub fn pinned_list<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    pinned: &[String],
) -> Result<()> {
    if pinned.is_empty() {
        return dim(prompter, "No pinned branches");
    }
    info(prompter, "📌  Current pinned branches:")?;
    for (i, branch) in pinned.iter().enumerate() {
        prompter.say(format!("  {} {branch}", format!("{}.", i + 1).green()))?;
    }
    Ok(())
}
