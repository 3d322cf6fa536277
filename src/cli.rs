//! CLI interface for qkpr.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commit;
pub mod editor;
pub mod menu;
pub mod picker;
pub mod pin;
pub mod pr;
pub mod prompt;
pub mod settings;
pub mod ui;

use crate::config::PreferenceStore;
use crate::error::{ErrorKind, FlowError};
use crate::git::GitRepository;
use prompt::Prompter;

/// qkpr: pull request links, AI commit messages and branch names.
#[derive(Parser)]
#[command(name = "qkpr")]
#[command(about = "Interactive Git assistant for pull requests, commit messages and branch names", long_about = None)]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    /// Prints version.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Preference file to use instead of ~/.qkpr/config.json.
    #[arg(long, global = true, env = "QKPR_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enables debug logging on stderr.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Command to run; the interactive menu opens when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Direct commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Creates a pull request link and description for the current branch.
    Pr,
    /// Generates a commit message from staged changes.
    Commit,
    /// Generates a branch name from staged changes.
    Branch,
    /// Configures the Gemini API key.
    Config,
    /// Selects the Gemini model.
    #[command(name = "config:model")]
    ConfigModel,
    /// Selects the language of the built-in prompts.
    #[command(name = "config:prompt-lang")]
    ConfigPromptLang,
    /// Sets or clears custom prompts.
    #[command(name = "config:prompts")]
    ConfigPrompts,
    /// Pins branches so they are listed first.
    Pin {
        /// Branch to pin; opens a picker when omitted.
        branch: Option<String>,
    },
    /// Unpins branches.
    Unpin {
        /// Branch to unpin; opens a picker when omitted.
        branch: Option<String>,
    },
    /// Lists pinned branches.
    Pinned,
}

/// How a flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The flow ran to the end.
    Completed,
    /// The user backed out.
    Cancelled,
}

/// State shared by every flow of one invocation.
pub struct Session<R, W> {
    /// Preference file.
    pub store: PreferenceStore,
    /// Repository in the working directory.
    pub repo: GitRepository,
    /// Terminal prompts.
    pub prompter: Prompter<R, W>,
}

impl<R, W> Session<R, W> {
    /// Bundles the parts of a session.
    pub fn new(store: PreferenceStore, repo: GitRepository, prompter: Prompter<R, W>) -> Self {
        Self {
            store,
            repo,
            prompter,
        }
    }
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        let store = PreferenceStore::open(self.config.as_deref())?;
        let mut session = Session::new(store, GitRepository::open(), Prompter::stdio());

        match self.command {
            None => menu::run(&mut session).await,
            Some(command) => command.run(&mut session).await,
        }
    }
}

impl Commands {
    /// Runs the command as a one-shot invocation.
    pub async fn run<R, W>(self, session: &mut Session<R, W>) -> Result<()>
    where
        R: BufRead,
        W: Write + Send,
    {
        let strict = self == Self::Pr;
        let result = match self {
            Self::Pr => pr::run(session).await,
            Self::Commit => commit::run_commit(session).await,
            Self::Branch => commit::run_branch(session).await,
            Self::Config => settings::configure_api_key(session).await,
            Self::ConfigModel => settings::configure_model(session).await,
            Self::ConfigPromptLang => settings::configure_prompt_language(session).await,
            Self::ConfigPrompts => settings::configure_prompts(session).await,
            Self::Pin { branch } => pin::pin(session, branch.as_deref()).await,
            Self::Unpin { branch } => pin::unpin(session, branch.as_deref()).await,
            Self::Pinned => pin::list_pinned(session).await,
        };
        finish_direct(result, strict, &mut session.prompter)
    }
}

/// Turns a flow result into the process result of a direct command.
///
/// Flow errors are printed and swallowed, except environment errors of
/// `strict` commands, which propagate so the process exits non-zero.
fn finish_direct<R: BufRead, W: Write>(
    result: Result<FlowOutcome>,
    strict: bool,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let Err(e) = result else {
        return Ok(());
    };
    match e.downcast_ref::<FlowError>() {
        Some(flow) if strict && flow.kind() == ErrorKind::Environment => Err(e),
        Some(_) => ui::report_error(prompter, &e),
        None => Err(e),
    }
}
