//! Pinned branch management flows.

use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::Utc;

use super::picker::pick_many;
use super::{ui, FlowOutcome, Session};
use crate::branch::{describe_branches, BranchPresentation};
use crate::config::{PinOutcome, UnpinOutcome};
use crate::error::FlowError;

fn preferences_error(e: &anyhow::Error) -> FlowError {
    FlowError::Preferences(format!("{e:#}"))
}

/// Pins `branch`, or lets the user pick several unpinned branches.
pub async fn pin<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    branch: Option<&str>,
) -> Result<FlowOutcome> {
    let prompter = &mut session.prompter;
    ui::info(prompter, "\n📌  Pin Branch")?;
    ui::dim(prompter, "Pin frequently used branches for quick access\n")?;

    if let Some(branch) = branch {
        match session.store.pin(branch).map_err(|e| preferences_error(&e))? {
            PinOutcome::AlreadyPinned => {
                ui::warning(prompter, &format!("Branch '{branch}' is already pinned"))?;
                return Ok(FlowOutcome::Completed);
            }
            PinOutcome::Pinned => {
                ui::success(prompter, &format!("Branch '{branch}' has been pinned"))?;
            }
        }
    } else {
        let branches = session.repo.list_branches().await;
        if branches.is_empty() {
            return Err(FlowError::NoBranches.into());
        }

        let prefs = session.store.load();
        let available: Vec<String> = branches
            .into_iter()
            .filter(|b| !prefs.is_pinned(b))
            .collect();
        if available.is_empty() {
            ui::warning(prompter, "All branches are already pinned")?;
            return Ok(FlowOutcome::Completed);
        }

        let descriptors = describe_branches(&session.repo, &available, Utc::now()).await;
        let presentation = BranchPresentation::flat_view(descriptors, &[]);
        let selected = pick_many(prompter, "📌  Select branches to pin:", &presentation, &[])?;
        if selected.is_empty() {
            ui::warning(prompter, "No branches selected")?;
            return Ok(FlowOutcome::Cancelled);
        }

        let added = session
            .store
            .pin_many(&selected)
            .map_err(|e| preferences_error(&e))?;
        ui::success(prompter, &format!("Pinned {added} branch(es)"))?;
    }

    prompter.say("")?;
    ui::pinned_list(prompter, &session.store.pinned_branches())?;
    Ok(FlowOutcome::Completed)
}

/// Unpins `branch`, or lets the user pick among pinned branches.
pub async fn unpin<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
    branch: Option<&str>,
) -> Result<FlowOutcome> {
    let prompter = &mut session.prompter;
    ui::info(prompter, "\n📍  Unpin Branch")?;
    ui::dim(prompter, "Remove a branch from pinned list\n")?;

    let pinned = session.store.pinned_branches();
    if pinned.is_empty() {
        ui::warning(prompter, "No pinned branches found")?;
        return Ok(FlowOutcome::Completed);
    }

    if let Some(branch) = branch {
        match session.store.unpin(branch).map_err(|e| preferences_error(&e))? {
            UnpinOutcome::NotPinned => {
                ui::failure(prompter, &format!("Branch '{branch}' is not pinned"))?;
                return Ok(FlowOutcome::Completed);
            }
            UnpinOutcome::Unpinned => {
                ui::success(prompter, &format!("Branch '{branch}' has been unpinned"))?;
            }
        }
    } else {
        let descriptors = describe_branches(&session.repo, &pinned, Utc::now()).await;
        let presentation = BranchPresentation::flat_view(descriptors, &pinned);
        let selected = pick_many(prompter, "📍  Select branches to unpin:", &presentation, &[])?;
        if selected.is_empty() {
            ui::warning(prompter, "No branches selected")?;
            return Ok(FlowOutcome::Cancelled);
        }

        let removed = session
            .store
            .unpin_many(&selected)
            .map_err(|e| preferences_error(&e))?;
        ui::success(prompter, &format!("Unpinned {removed} branch(es)"))?;
    }

    prompter.say("")?;
    ui::pinned_list(prompter, &session.store.pinned_branches())?;
    Ok(FlowOutcome::Completed)
}

/// Prints the pinned branches.
pub async fn list_pinned<R: BufRead, W: Write>(
    session: &mut Session<R, W>,
) -> Result<FlowOutcome> {
    let prompter = &mut session.prompter;
    ui::info(prompter, "\n📌  Pinned Branches")?;

    let pinned = session.store.pinned_branches();
    if pinned.is_empty() {
        ui::warning(prompter, "No pinned branches found")?;
        ui::dim(prompter, "Use \"qkpr pin <branch-name>\" to pin a branch")?;
    } else {
        ui::pinned_list(prompter, &pinned)?;
    }
    Ok(FlowOutcome::Completed)
}
