//! Pull request creation flow.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::Utc;
use tracing::debug;

use super::picker::pick_branch;
use super::{ui, FlowOutcome, Session};
use crate::branch::{describe_branches, BranchPresentation};
use crate::error::FlowError;
use crate::pr::PullRequestDraft;
use crate::utils::{check_git_repository, copy_to_clipboard, open_browser};

/// Target used when there is nothing else to choose from.
pub const FALLBACK_TARGET: &str = "main";

/// Picks a target branch, then prints, copies and opens the PR link.
pub async fn run<R: BufRead, W: Write>(session: &mut Session<R, W>) -> Result<FlowOutcome> {
    let prompter = &mut session.prompter;
    ui::banner(prompter, "🔧  Quick PR Creator")?;

    let info = check_git_repository(&session.repo).await?;
    ui::info(prompter, "📍  Current Repository Information:")?;
    ui::dim(prompter, &format!("  Branch: {}", info.current_branch))?;
    ui::dim(prompter, &format!("  Remote: {}", info.remote_url))?;
    prompter.say("")?;

    let branches = session.repo.list_branches().await;
    if branches.is_empty() {
        return Err(FlowError::NoBranches.into());
    }

    let candidates: Vec<String> = branches
        .into_iter()
        .filter(|b| *b != info.current_branch)
        .collect();
    let descriptors = describe_branches(&session.repo, &candidates, Utc::now()).await;
    let prefs = session.store.load();
    let presentation = BranchPresentation::category_view(descriptors, &prefs.pinned_branches);
    debug!(candidates = presentation.len(), "Target branch candidates");

    let target = if presentation.is_empty() {
        ui::warning(prompter, &format!("No other branches, using '{FALLBACK_TARGET}'"))?;
        FALLBACK_TARGET.to_string()
    } else {
        match pick_branch(prompter, "Select target branch:", &presentation)? {
            Some(target) => target,
            None => {
                ui::warning(prompter, "Cancelled")?;
                return Ok(FlowOutcome::Cancelled);
            }
        }
    };
    ui::success(prompter, &format!("Selected target branch: {target}"))?;

    let draft = PullRequestDraft::build(
        &session.repo,
        &info.remote_url,
        &info.current_branch,
        &target,
        prefs.prompt_language(),
    )
    .await?;

    ui::info(prompter, "\n📋  PR Description Generated:\n")?;
    prompter.say(&draft.message)?;
    ui::info(prompter, "\n👉  PR URL:\n")?;
    ui::success(prompter, &draft.url)?;
    prompter.say("")?;

    if copy_to_clipboard(&draft.message).await {
        ui::success(prompter, "PR description copied to clipboard")?;
    } else {
        ui::warning(prompter, "Could not copy to clipboard")?;
    }

    ui::info(prompter, "\n🌐  Opening PR page in browser...")?;
    if open_browser(&draft.url).await {
        ui::success(prompter, "Browser opened successfully")?;
    } else {
        ui::warning(prompter, "Could not open browser automatically")?;
        ui::dim(prompter, &format!("Please open manually: {}", draft.url))?;
    }

    let merge_branch = &draft.suggested_merge_branch_name;
    ui::warning(prompter, &format!("💡  Suggested merge branch name: {merge_branch}"))?;
    if prompter.confirm(
        "Do you want to create a merge branch for conflict resolution?",
        false,
    )? {
        create_merge_branch(session, &target, merge_branch).await?;
    }

    ui::success(&mut session.prompter, "🎉  PR creation process completed!")?;
    Ok(FlowOutcome::Completed)
}

/// Checks out `target` and branches `name` off it.
///
/// Git failures are reported, not propagated.
async fn create_merge_branch<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    target: &str,
    name: &str,
) -> Result<()> {
    let prompter = &mut session.prompter;
    ui::info(prompter, &format!("🔄  Switching to {target}..."))?;
    if let Err(e) = session.repo.checkout(target).await {
        return ui::failure(prompter, &format!("Failed to switch to {target}: {e}"));
    }

    ui::info(prompter, &format!("🌿  Creating merge branch {name}..."))?;
    match session.repo.create_branch(name).await {
        Ok(()) => ui::success(prompter, &format!("Created and switched to {name}")),
        Err(e) => ui::failure(prompter, &format!("Failed to create {name}: {e}")),
    }
}
