//! Pull request link, description and merge-branch name generation.

use serde::Serialize;
use tracing::debug;

use crate::config::PromptLanguage;
use crate::error::FlowError;
use crate::git::{parse_remote_url, GitRepository, ParsedRemote, Protocol};

/// Hosting flavour, chosen from the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// GitHub compare view.
    GitHub,
    /// GitLab/Gitee-style "new merge request" form.
    GenericMergeRequest,
}

impl Provider {
    /// Picks the provider for a host.
    pub fn for_host(host: &str) -> Self {
        if host.contains("github.com") {
            Self::GitHub
        } else {
            Self::GenericMergeRequest
        }
    }

    /// Builds the page URL for opening a PR from `source` into `target`.
    pub fn compare_url(
        self,
        base_url: &str,
        source: &str,
        target: &str,
    ) -> String {
        match self {
            Self::GitHub => format!("{base_url}/compare/{target}...{source}"),
            Self::GenericMergeRequest => format!(
                "{base_url}/merge_requests/new?merge_request%5Bsource_branch%5D={}&merge_request%5Btarget_branch%5D={}",
                urlencoding::encode(source),
                urlencoding::encode(target)
            ),
        }
    }
}

/// Builds the provider-specific compare / merge-request URL.
pub fn generate_compare_url(
    host: &str,
    repo_path: &str,
    protocol: Protocol,
    source: &str,
    target: &str,
) -> String {
    let base_url = format!("{protocol}://{host}/{repo_path}");
    Provider::for_host(host).compare_url(&base_url, source, target)
}

/// Renders the PR description from `- <subject>` commit lines.
pub fn format_pr_message(
    source: &str,
    target: &str,
    commit_lines: &[String],
    language: PromptLanguage,
) -> String {
    let mut message =
        format!("### 🔧 PR: `{source}` → `{target}`\n\n#### 📝 Commit Summary:\n");

    if commit_lines.is_empty() {
        message.push_str(match language {
            PromptLanguage::En => "\n(no differing commits)",
            PromptLanguage::Zh => "\n（无差异提交）",
        });
    } else {
        message.push_str(&commit_lines.join("\n"));
    }

    message
}

/// Suggests a branch name for resolving conflicts between two branches.
///
/// Distinct pairs can collapse to the same name (`a/b` vs `a-b`); no
/// collision check is made.
pub fn generate_merge_branch_name(source: &str, target: &str) -> String {
    format!(
        "merge/{}-to-{}",
        source.replace('/', "-"),
        target.replace('/', "-")
    )
}

/// Everything needed to open a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestDraft {
    /// Branch with the changes.
    pub source_branch: String,
    /// Branch to merge into.
    pub target_branch: String,
    /// Browser URL for creating the PR.
    pub url: String,
    /// Markdown description.
    pub message: String,
    /// Suggested name for a conflict-resolution branch.
    pub suggested_merge_branch_name: String,
}

impl PullRequestDraft {
    /// Assembles a draft from already-collected inputs.
    pub fn new(
        remote: &ParsedRemote,
        source: &str,
        target: &str,
        commit_lines: &[String],
        language: PromptLanguage,
    ) -> Self {
        Self {
            source_branch: source.to_string(),
            target_branch: target.to_string(),
            url: generate_compare_url(
                &remote.host,
                &remote.repo_path,
                remote.protocol,
                source,
                target,
            ),
            message: format_pr_message(source, target, commit_lines, language),
            suggested_merge_branch_name: generate_merge_branch_name(source, target),
        }
    }

    /// Parses the remote and reads the commit list from the repository.
    pub async fn build(
        repo: &GitRepository,
        remote_url: &str,
        source: &str,
        target: &str,
        language: PromptLanguage,
    ) -> Result<Self, FlowError> {
        let remote = parse_remote_url(remote_url)
            .ok_or_else(|| FlowError::UnparseableRemote(remote_url.to_string()))?;
        let commit_lines = repo.commit_subjects_between(target, source).await;

        debug!(
            host = %remote.host,
            repo_path = %remote.repo_path,
            commits = commit_lines.len(),
            "building pull request draft"
        );

        Ok(Self::new(&remote, source, target, &commit_lines, language))
    }
}
