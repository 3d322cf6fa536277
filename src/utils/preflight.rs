//! Preflight validation checks for early failure detection.
//!
//! Flows call these before prompting, so the user is not asked questions
//! whose answers cannot be used.

use crate::ai::AiError;
use crate::config::Preferences;
use crate::error::FlowError;
use crate::git::{GitRepository, RepositoryInfo};

/// Credentials and model for the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiCredentialInfo {
    /// API key from the preference file or environment.
    pub api_key: String,
    /// Model to draft with.
    pub model: String,
}

/// Validates that the working directory is a repository with an `origin`.
pub async fn check_git_repository(repo: &GitRepository) -> Result<RepositoryInfo, FlowError> {
    let info = repo.info().await;
    if info.is_git_repository {
        Ok(info)
    } else {
        Err(FlowError::NotGitRepository)
    }
}

/// Validates that something is staged for commit.
pub async fn check_staged_changes(repo: &GitRepository) -> Result<(), FlowError> {
    if repo.has_staged_changes().await {
        Ok(())
    } else {
        Err(FlowError::NoStagedChanges)
    }
}

/// Resolves the API key and model, failing when no key is configured.
pub fn check_ai_credentials(prefs: &Preferences) -> Result<AiCredentialInfo, AiError> {
    let api_key = prefs.resolve_api_key().ok_or(AiError::ApiKeyNotFound)?;
    Ok(AiCredentialInfo {
        api_key,
        model: prefs.resolve_model(),
    })
}
