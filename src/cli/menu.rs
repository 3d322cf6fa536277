//! Interactive main menu shown when no subcommand is given.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::debug;

use super::{commit, pin, pr, settings, ui, FlowOutcome, Session};

/// Entries of the main menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MenuEntry {
    CreatePr,
    CommitMessage,
    BranchName,
    Pin,
    Unpin,
    ListPinned,
    ApiKey,
    Model,
    PromptLanguage,
    CustomPrompts,
    Exit,
}

impl MenuEntry {
    /// Every entry, in display order.
    pub const ALL: [Self; 11] = [
        Self::CreatePr,
        Self::CommitMessage,
        Self::BranchName,
        Self::Pin,
        Self::Unpin,
        Self::ListPinned,
        Self::ApiKey,
        Self::Model,
        Self::PromptLanguage,
        Self::CustomPrompts,
        Self::Exit,
    ];

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::CreatePr => "🔧  Create Pull Request",
            Self::CommitMessage => "🤖  Generate Commit Message",
            Self::BranchName => "🌿  Generate Branch Name",
            Self::Pin => "📌  Pin Branches",
            Self::Unpin => "📍  Unpin Branches",
            Self::ListPinned => "📋  List Pinned Branches",
            Self::ApiKey => "⚙️   Configure API Key",
            Self::Model => "🔧  Configure Model",
            Self::PromptLanguage => "🌐  Configure Prompt Language",
            Self::CustomPrompts => "📝  Configure Custom Prompts",
            Self::Exit => "🚪  Exit",
        }
    }

    async fn run<R, W>(self, session: &mut Session<R, W>) -> Result<FlowOutcome>
    where
        R: BufRead,
        W: Write + Send,
    {
        match self {
            Self::CreatePr => pr::run(session).await,
            Self::CommitMessage => commit::run_commit(session).await,
            Self::BranchName => commit::run_branch(session).await,
            Self::Pin => pin::pin(session, None).await,
            Self::Unpin => pin::unpin(session, None).await,
            Self::ListPinned => pin::list_pinned(session).await,
            Self::ApiKey => settings::configure_api_key(session).await,
            Self::Model => settings::configure_model(session).await,
            Self::PromptLanguage => settings::configure_prompt_language(session).await,
            Self::CustomPrompts => settings::configure_prompts(session).await,
            Self::Exit => Ok(FlowOutcome::Completed),
        }
    }
}

/// Runs the menu until the user exits or input ends.
///
/// A failing flow is reported and the menu is shown again.
pub async fn run<R, W>(session: &mut Session<R, W>) -> Result<()>
where
    R: BufRead,
    W: Write + Send,
{
    ui::banner(&mut session.prompter, "🚀  qkpr: Quick PR & AI Git Assistant")?;
    ui::dim(
        &mut session.prompter,
        &format!("Version {}\n", env!("CARGO_PKG_VERSION")),
    )?;

    loop {
        let labels = MenuEntry::ALL.map(MenuEntry::label);
        let Some(index) = session
            .prompter
            .select("What would you like to do?", &labels, 0)?
        else {
            break;
        };
        let entry = MenuEntry::ALL[index];
        if entry == MenuEntry::Exit {
            break;
        }

        debug!(?entry, "Menu entry chosen");
        match entry.run(session).await {
            Ok(outcome) => debug!(?outcome, "Flow finished"),
            Err(e) => ui::report_error(&mut session.prompter, &e)?,
        }
        session.prompter.say("")?;
    }

    ui::dim(&mut session.prompter, "👋  Goodbye!")?;
    Ok(())
}
