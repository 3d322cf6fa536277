//! Error taxonomy for user-facing flows.

use thiserror::Error;

use crate::ai::AiError;
use crate::git::GitError;

/// Broad classification of a [`FlowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The local environment cannot support the operation.
    Environment,
    /// An external command (git, clipboard, browser) failed.
    ExternalCommand,
    /// The generation endpoint failed.
    RemoteService,
    /// The preference file could not be written.
    Configuration,
}

/// Errors that end a single flow and return control to the caller.
#[derive(Error, Debug)]
pub enum FlowError {
    /// The working directory is not inside a usable Git repository.
    #[error("Not a Git repository")]
    NotGitRepository,

    /// Branch enumeration returned nothing.
    #[error("No branches found")]
    NoBranches,

    /// Nothing is staged for commit.
    #[error("No staged changes found")]
    NoStagedChanges,

    /// The origin URL is in none of the supported forms.
    #[error("Unable to parse remote URL: {0}")]
    UnparseableRemote(String),

    /// Reading or writing preferences failed.
    #[error("Failed to update preferences: {0}")]
    Preferences(String),

    /// A git invocation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The generation endpoint failed.
    #[error(transparent)]
    Ai(#[from] AiError),
}

impl FlowError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotGitRepository
            | Self::NoBranches
            | Self::NoStagedChanges
            | Self::UnparseableRemote(_) => ErrorKind::Environment,
            Self::Preferences(_) => ErrorKind::Configuration,
            Self::Git(_) => ErrorKind::ExternalCommand,
            Self::Ai(AiError::EmptyDiff) => ErrorKind::Environment,
            Self::Ai(_) => ErrorKind::RemoteService,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(FlowError::NotGitRepository.kind(), ErrorKind::Environment);
        assert_eq!(
            FlowError::UnparseableRemote("ftp://x".into()).kind(),
            ErrorKind::Environment
        );
        assert_eq!(
            FlowError::from(GitError::NotInstalled).kind(),
            ErrorKind::ExternalCommand
        );
        assert_eq!(
            FlowError::from(AiError::NetworkError("reset".into())).kind(),
            ErrorKind::RemoteService
        );
        assert_eq!(FlowError::from(AiError::EmptyDiff).kind(), ErrorKind::Environment);
        assert_eq!(
            FlowError::Preferences("disk full".into()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn git_errors_display_transparently() {
        let err = FlowError::from(GitError::NotInstalled);
        assert_eq!(err.to_string(), "git executable not found in PATH");
    }
}
