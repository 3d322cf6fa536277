//! Line-oriented terminal prompts.

use std::io::{self, BufRead, BufReader, IsTerminal, Stdin, Stdout, Write};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Asks questions on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    pub(crate) output: W,
    raw_terminal: bool,
}

impl Prompter<BufReader<Stdin>, Stdout> {
    /// Prompts on the process's terminal.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let raw_terminal = stdin.is_terminal();
        Self {
            input: BufReader::new(stdin),
            output: io::stdout(),
            raw_terminal,
        }
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Prompts over arbitrary streams. Masked input falls back to plain
    /// line reading.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            raw_terminal: false,
        }
    }

    /// Returns the output stream.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consumes the prompter, returning the output stream.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Writes a line to the output.
    pub fn say(&mut self, line: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", line.as_ref()).context("Failed to write to terminal")
    }

    /// Reads one trimmed line. End of input counts as an empty answer.
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("Failed to read user input")?;
        Ok(line.trim().to_string())
    }

    /// Prints `question` and returns the trimmed answer.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "❓ {question} ")?;
        self.output.flush()?;
        self.read_line()
    }

    /// Asks for free text; an empty answer yields `default`.
    pub fn input(&mut self, question: &str, default: Option<&str>) -> Result<String> {
        let answer = match default {
            Some(default) => self.ask(&format!("{question} ({default}):"))?,
            None => self.ask(question)?,
        };
        Ok(if answer.is_empty() {
            default.unwrap_or_default().to_string()
        } else {
            answer
        })
    }

    /// Asks a yes/no question.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(&format!("{question} {hint}"))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer y or n.")?,
            }
        }
    }

    /// Shows a numbered menu and returns the chosen index.
    ///
    /// An empty answer picks `default`. End of input returns `None`.
    pub fn select<S: AsRef<str>>(
        &mut self,
        question: &str,
        options: &[S],
        default: usize,
    ) -> Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }

        self.say(question)?;
        for (i, option) in options.iter().enumerate() {
            let marker = if i == default { "›" } else { " " };
            self.say(format!("  {marker} {}. {}", i + 1, option.as_ref()))?;
        }

        loop {
            write!(self.output, "Enter a number [{}]: ", default + 1)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if answer.is_empty() {
                return Ok(Some(default.min(options.len() - 1)));
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.say(format!("Please enter a number between 1 and {}.", options.len()))?,
            }
        }
    }

    /// Asks for a secret without echoing it.
    pub fn masked(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "🔑 {question} ")?;
        self.output.flush()?;

        if !self.raw_terminal {
            let answer = self.read_line()?;
            return Ok((!answer.is_empty()).then_some(answer));
        }

        let secret = read_masked(&mut self.output)?;
        Ok(secret.filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string()))
    }
}

/// Reads a line in raw mode, echoing `*` per character.
///
/// Returns `None` on Ctrl+C, Ctrl+D or Esc.
fn read_masked<W: Write>(output: &mut W) -> Result<Option<String>> {
    enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let _guard = RawModeGuard;

    let mut buffer = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        match key.code {
            KeyCode::Enter => {
                write!(output, "\r\n")?;
                output.flush()?;
                return Ok(Some(buffer));
            }
            KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                write!(output, "\r\n")?;
                return Ok(None);
            }
            KeyCode::Esc => {
                write!(output, "\r\n")?;
                return Ok(None);
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                write!(output, "*")?;
                output.flush()?;
            }
            KeyCode::Backspace => {
                if buffer.pop().is_some() {
                    write!(output, "\x08 \x08")?;
                    output.flush()?;
                }
            }
            _ => {}
        }
    }
}
