//! Commit message and branch name drafting flows.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use super::prompt::Prompter;
use super::{ui, FlowOutcome, Session};
use crate::ai::{
    AiError, DraftAction, DraftKind, DraftService, DraftSession, DraftState, GeminiClient,
    PromptMode,
};
use crate::config::{Preferences, PreferenceStore};
use crate::error::FlowError;
use crate::utils::{check_ai_credentials, check_staged_changes, copy_to_clipboard};

/// Where to get an API key.
pub(crate) const API_KEY_URL: &str = "https://aistudio.google.com/apikey";

/// Choices offered after a commit message is drafted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitAction {
    Commit,
    Copy,
    SuggestBranch,
    Regenerate,
    Cancel,
}

impl CommitAction {
    const ALL: [Self; 5] = [
        Self::Commit,
        Self::Copy,
        Self::SuggestBranch,
        Self::Regenerate,
        Self::Cancel,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Commit => "✅  Commit with this message",
            Self::Copy => "📋  Copy to clipboard",
            Self::SuggestBranch => "🌿  Suggest a branch name",
            Self::Regenerate => "🔄  Regenerate",
            Self::Cancel => "❌  Cancel",
        }
    }
}

/// Asks for an API key until one is entered or the user goes back.
pub(crate) fn prompt_api_key<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
) -> Result<Option<String>> {
    loop {
        let choice = prompter.select(
            "Please enter your Gemini API Key:",
            &["✏️  Enter API Key", "↩️  Go back"],
            0,
        )?;
        if choice != Some(0) {
            return Ok(None);
        }
        match prompter.masked("API Key:")? {
            Some(key) => return Ok(Some(key)),
            None => ui::warning(prompter, "Please enter a valid API Key, or go back")?,
        }
    }
}

/// Uses the configured key, or asks for one and offers to save it.
async fn ensure_api_key<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    store: &PreferenceStore,
    prefs: &Preferences,
) -> Result<Option<String>> {
    if let Ok(credentials) = check_ai_credentials(prefs) {
        return Ok(Some(credentials.api_key));
    }

    ui::warning(prompter, "Gemini API Key not found")?;
    ui::dim(prompter, &format!("Get your API Key from: {API_KEY_URL}"))?;
    let Some(key) = prompt_api_key(prompter)? else {
        return Ok(None);
    };

    if prompter.confirm("Save API Key for future use?", true)? {
        store
            .set_api_key(&key)
            .map_err(|e| FlowError::Preferences(format!("{e:#}")))?;
        ui::success(prompter, "API Key saved")?;
    }
    Ok(Some(key))
}

/// Common preamble: repository, staged changes, credentials and diff.
async fn prepare<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    kind: DraftKind,
) -> Result<Option<(Preferences, GeminiClient, String)>> {
    if !session.repo.is_repository().await {
        return Err(FlowError::NotGitRepository.into());
    }

    let prefs = session.store.load();
    let model = prefs.resolve_model();
    let prompter = &mut session.prompter;
    ui::dim(prompter, &format!("Using model: {model}"))?;
    match PromptMode::for_kind(kind, &prefs) {
        PromptMode::Custom => ui::dim(prompter, &format!("Using custom {kind} prompt"))?,
        PromptMode::BuiltIn(language) => {
            ui::dim(prompter, &format!("Using {language} {kind} prompt"))?;
        }
    }

    check_staged_changes(&session.repo).await?;

    let Some(api_key) = ensure_api_key(prompter, &session.store, &prefs).await? else {
        ui::warning(prompter, "Cancelled")?;
        return Ok(None);
    };

    let diff = session
        .repo
        .staged_diff()
        .await
        .context("Failed to get git diff")?;
    let client = GeminiClient::new(api_key, model).map_err(FlowError::from)?;
    Ok(Some((prefs, client, diff)))
}

/// Drafts while echoing fragments to the terminal.
async fn stream_draft<R: BufRead, W: Write + Send>(
    prompter: &mut Prompter<R, W>,
    service: &DraftService<'_>,
    kind: DraftKind,
    diff: &str,
) -> Result<String, AiError> {
    let output = prompter.output();
    if let Err(e) = writeln!(output, "\n🤖  Generating {kind} with {}...\n", service.model()) {
        debug!(error = %e, "Could not write to terminal");
    }

    let mut sink = |chunk: &str| {
        if let Err(e) = write!(output, "{chunk}").and_then(|()| output.flush()) {
            debug!(error = %e, "Could not echo streamed text");
        }
    };
    let result = service.draft(kind, diff, &mut sink).await;
    if let Err(e) = writeln!(prompter.output(), "\n") {
        debug!(error = %e, "Could not write to terminal");
    }
    result
}

/// Drafts a commit message, then commits, copies or regenerates it.
pub async fn run_commit<R, W>(session: &mut Session<R, W>) -> Result<FlowOutcome>
where
    R: BufRead,
    W: Write + Send,
{
    ui::banner(&mut session.prompter, "🤖  AI Commit Message Generator")?;
    let Some((prefs, client, diff)) = prepare(session, DraftKind::Commit).await? else {
        return Ok(FlowOutcome::Cancelled);
    };
    let service = DraftService::new(&client, &prefs);
    let prompter = &mut session.prompter;

    let mut drafts = DraftSession::new();
    while !drafts.is_finished() {
        if drafts.needs_draft() {
            let outcome = stream_draft(prompter, &service, DraftKind::Commit, &diff).await;
            if let Err(e) = &outcome {
                ui::failure(prompter, &format!("Error generating commit message: {e}"))?;
            }
            drafts.record(outcome);
            continue;
        }

        match drafts.state().clone() {
            DraftState::Drafted(message) => {
                let labels = CommitAction::ALL.map(CommitAction::label);
                let action = prompter
                    .select("What would you like to do?", &labels, 0)?
                    .map_or(CommitAction::Cancel, |i| CommitAction::ALL[i]);
                debug!(?action, attempt = drafts.attempts(), "Commit action chosen");

                match action {
                    CommitAction::Commit => {
                        drafts.apply(DraftAction::Accept);
                    }
                    CommitAction::Copy => {
                        if copy_to_clipboard(&message).await {
                            ui::success(prompter, "Commit message copied to clipboard")?;
                        } else {
                            ui::warning(prompter, "Could not copy to clipboard")?;
                        }
                        return Ok(FlowOutcome::Completed);
                    }
                    CommitAction::SuggestBranch => {
                        match stream_draft(prompter, &service, DraftKind::Branch, &diff).await {
                            Ok(name) => {
                                ui::success(prompter, &format!("Suggested branch name: {name}"))?;
                            }
                            Err(e) => ui::failure(
                                prompter,
                                &format!("Error generating branch name: {e}"),
                            )?,
                        }
                    }
                    CommitAction::Regenerate => {
                        ui::warning(prompter, "🔄  Regenerating...")?;
                        drafts.apply(DraftAction::Regenerate);
                    }
                    CommitAction::Cancel => {
                        drafts.apply(DraftAction::Cancel);
                    }
                }
            }
            DraftState::Failed(_) => {
                let retry = prompter.select("What would you like to do?", &["🔄  Retry", "❌  Cancel"], 0)?;
                drafts.apply(if retry == Some(0) {
                    DraftAction::Regenerate
                } else {
                    DraftAction::Cancel
                });
            }
            _ => {}
        }
    }

    let Some(message) = drafts.into_accepted() else {
        ui::dim(prompter, "Cancelled")?;
        return Ok(FlowOutcome::Cancelled);
    };

    if let Err(e) = session.repo.commit(&message).await {
        ui::failure(&mut session.prompter, &format!("Commit failed: {e}"))?;
        return Ok(FlowOutcome::Completed);
    }
    ui::success(&mut session.prompter, "Commit successful!")?;

    if session
        .prompter
        .confirm("Push the changes to the remote repository?", true)?
    {
        push_current_branch(session).await?;
    }
    Ok(FlowOutcome::Completed)
}

async fn push_current_branch<R: BufRead, W: Write>(session: &mut Session<R, W>) -> Result<()> {
    let branch = match session.repo.current_branch().await {
        Ok(branch) if !branch.is_empty() => branch,
        _ => {
            return ui::failure(
                &mut session.prompter,
                "Could not determine the current branch name.",
            )
        }
    };

    let prompter = &mut session.prompter;
    if session.repo.remote_branch_exists(&branch).await {
        ui::info(prompter, &format!("📤  Pushing {branch} to origin"))?;
    } else {
        ui::info(prompter, &format!("📤  Publishing new branch {branch} to origin"))?;
    }

    match session.repo.push_upstream(&branch).await {
        Ok(()) => ui::success(prompter, &format!("Branch pushed successfully: {branch}")),
        Err(e) => ui::failure(prompter, &format!("Failed to push changes: {e}")),
    }
}

/// Drafts a branch name, then creates or copies it.
pub async fn run_branch<R, W>(session: &mut Session<R, W>) -> Result<FlowOutcome>
where
    R: BufRead,
    W: Write + Send,
{
    ui::banner(&mut session.prompter, "🌿  AI Branch Name Generator")?;
    let Some((prefs, client, diff)) = prepare(session, DraftKind::Branch).await? else {
        return Ok(FlowOutcome::Cancelled);
    };
    let service = DraftService::new(&client, &prefs);
    let prompter = &mut session.prompter;

    let name = stream_draft(prompter, &service, DraftKind::Branch, &diff)
        .await
        .map_err(FlowError::from)?;
    ui::success(prompter, &format!("Suggested branch name: {name}"))?;

    if prompter.confirm(&format!("Create and switch to branch '{name}'?"), false)? {
        ui::info(prompter, &format!("🌿  Creating and switching to branch: {name}"))?;
        match session.repo.create_branch(&name).await {
            Ok(()) => ui::success(prompter, &format!("Successfully created and switched to: {name}"))?,
            Err(e) => ui::failure(prompter, &format!("Failed to create branch: {e}"))?,
        }
    } else if prompter.confirm("Copy branch name to clipboard?", true)? {
        if copy_to_clipboard(&name).await {
            ui::success(prompter, "Branch name copied to clipboard")?;
        } else {
            ui::warning(prompter, "Could not copy to clipboard")?;
        }
    }

    Ok(FlowOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::prompt::tests::{scripted, transcript};

    #[test]
    fn api_key_prompt_accepts_key() {
        let mut p = scripted("1\n  abc-123 \n");
        assert_eq!(prompt_api_key(&mut p).unwrap().as_deref(), Some("abc-123"));
    }

    #[test]
    fn api_key_prompt_retries_then_goes_back() {
        let mut p = scripted("\n\n2\n");
        assert_eq!(prompt_api_key(&mut p).unwrap(), None);
        assert!(transcript(p).contains("Please enter a valid API Key"));
    }

    #[test]
    fn action_labels_line_up() {
        let labels = CommitAction::ALL.map(CommitAction::label);
        assert_eq!(labels.len(), 5);
        assert!(labels[3].contains("Regenerate"));
    }

    #[tokio::test]
    async fn commit_outside_repository_fails_early() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(
            PreferenceStore::at(dir.path().join("config.json")),
            crate::git::GitRepository::open_at(dir.path()),
            scripted(""),
        );
        let err = run_commit(&mut session).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FlowError>(),
            Some(FlowError::NotGitRepository)
        ));
    }
}
