//! Git repository operations backed by the `git` executable.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::error::GitError;
use super::runner::{run_git, run_git_inherited};

/// Name of the remote every operation targets.
pub const DEFAULT_REMOTE: &str = "origin";

/// Snapshot of the local repository taken once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    /// Short name of the checked-out branch.
    pub current_branch: String,
    /// URL of the `origin` remote.
    pub remote_url: String,
    /// Whether both of the above could be resolved.
    pub is_git_repository: bool,
}

impl RepositoryInfo {
    fn not_a_repository() -> Self {
        Self {
            current_branch: String::new(),
            remote_url: String::new(),
            is_git_repository: false,
        }
    }
}

/// Git repository wrapper.
#[derive(Debug, Clone)]
pub struct GitRepository {
    workdir: PathBuf,
}

impl GitRepository {
    /// Opens the repository containing the current directory.
    pub fn open() -> Self {
        Self::open_at(".")
    }

    /// Opens the repository at the specified path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            workdir: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the working directory git is invoked in.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Checks whether the working directory is inside a git repository.
    pub async fn is_repository(&self) -> bool {
        run_git(&self.workdir, &["rev-parse", "--git-dir"])
            .await
            .is_ok()
    }

    /// Reads the current branch and origin URL.
    ///
    /// A repository without a symbolic HEAD or without an `origin` remote is
    /// reported as not usable rather than as an error.
    pub async fn info(&self) -> RepositoryInfo {
        let current_branch =
            match run_git(&self.workdir, &["symbolic-ref", "--quiet", "--short", "HEAD"]).await {
                Ok(branch) => branch,
                Err(e) => {
                    debug!(error = %e, "could not resolve current branch");
                    return RepositoryInfo::not_a_repository();
                }
            };

        let remote_key = format!("remote.{DEFAULT_REMOTE}.url");
        let remote_url = match run_git(&self.workdir, &["config", "--get", &remote_key]).await {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "could not resolve remote URL");
                return RepositoryInfo::not_a_repository();
            }
        };

        RepositoryInfo {
            current_branch,
            remote_url,
            is_git_repository: true,
        }
    }

    /// Returns the current branch name.
    pub async fn current_branch(&self) -> Result<String, GitError> {
        run_git(&self.workdir, &["branch", "--show-current"]).await
    }

    /// Lists local and `origin` branches, deduplicated and sorted.
    ///
    /// Returns an empty list when git fails.
    pub async fn list_branches(&self) -> Vec<String> {
        match run_git(&self.workdir, &["branch", "-a"]).await {
            Ok(output) => parse_branch_listing(&output),
            Err(e) => {
                debug!(error = %e, "failed to list branches");
                Vec::new()
            }
        }
    }

    /// Returns the epoch seconds of a branch tip, preferring `origin/<branch>`.
    pub async fn last_commit_timestamp(&self, branch: &str) -> Option<i64> {
        let remote_ref = format!("{DEFAULT_REMOTE}/{branch}");
        for reference in [remote_ref.as_str(), branch] {
            match run_git(&self.workdir, &["log", "-1", "--format=%ct", reference, "--"]).await {
                Ok(output) => {
                    if let Ok(timestamp) = output.trim().parse::<i64>() {
                        return Some(timestamp);
                    }
                }
                Err(e) => debug!(reference, error = %e, "no commit timestamp for reference"),
            }
        }
        None
    }

    /// Lists commit subjects reachable from `source` but not from `target`.
    ///
    /// Lines come back newest first, each rendered as `- <subject>`.
    pub async fn commit_subjects_between(&self, target: &str, source: &str) -> Vec<String> {
        let range = format!("{target}..{source}");
        match run_git(
            &self.workdir,
            &["log", "--pretty=format:- %s", &range, "--"],
        )
        .await
        {
            Ok(output) => output
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                debug!(range = %range, error = %e, "failed to list commits between branches");
                Vec::new()
            }
        }
    }

    /// Returns the staged diff.
    pub async fn staged_diff(&self) -> Result<String, GitError> {
        run_git(&self.workdir, &["diff", "--cached"]).await
    }

    /// Checks whether anything is staged for commit.
    pub async fn has_staged_changes(&self) -> bool {
        run_git(&self.workdir, &["diff", "--cached", "--name-only"])
            .await
            .is_ok_and(|names| !names.is_empty())
    }

    /// Checks whether `origin` has a head named `branch`.
    pub async fn remote_branch_exists(&self, branch: &str) -> bool {
        run_git(
            &self.workdir,
            &["ls-remote", "--heads", DEFAULT_REMOTE, branch],
        )
        .await
        .is_ok_and(|heads| !heads.is_empty())
    }

    /// Switches to an existing branch.
    pub async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        run_git_inherited(&self.workdir, &["checkout", branch]).await
    }

    /// Creates a branch from HEAD and switches to it.
    pub async fn create_branch(&self, branch: &str) -> Result<(), GitError> {
        run_git_inherited(&self.workdir, &["checkout", "-b", branch]).await
    }

    /// Commits the staged changes with the given message.
    pub async fn commit(&self, message: &str) -> Result<(), GitError> {
        run_git_inherited(&self.workdir, &["commit", "-m", message]).await
    }

    /// Pushes a branch to `origin`, setting it as upstream.
    pub async fn push_upstream(&self, branch: &str) -> Result<(), GitError> {
        run_git_inherited(&self.workdir, &["push", "-u", DEFAULT_REMOTE, branch]).await
    }
}

/// Parses `git branch -a` output into unique, sorted branch names.
pub fn parse_branch_listing(output: &str) -> Vec<String> {
    let remote_prefix = format!("remotes/{DEFAULT_REMOTE}/");

    output
        .lines()
        .map(|line| line.trim_start_matches(['*', '+']).trim())
        .filter(|line| !line.starts_with('('))
        .map(|line| line.strip_prefix(&remote_prefix).unwrap_or(line))
        .filter(|name| !name.is_empty() && *name != "HEAD" && !name.contains("->"))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
